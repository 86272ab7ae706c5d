//! Client-side authentication session
//!
//! A [`SessionManager`] owns the access token of one context and keeps the
//! shared session status in sync with it. Several managers backed by the same
//! [`SharedStorage`] observe each other's status changes but never share
//! tokens.

mod bootstrap;
mod coordinator;
mod facade;
pub mod queue;
pub mod server;


use crate::bot::BotVerifier;
use crate::client::error::ClientError;
use crate::client::interceptor::RequestInterceptor;
use crate::client::oauth::{AuthApi, OAuthClient};
use crate::client::{NomdocClient, NomdocClientBuilder};
use async_trait::async_trait;
use nomdoc_core::{
    AccessToken, Clock, SessionConfig, SessionStatus, SharedStorage, StatusStore, SystemClock,
    TokenState,
};
use queue::RequestQueue;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use server::{ServerSession, fetch_server_session, initial_status, parse_cookies, refresh_token_cookie};

/// Token and refresh state, guarded together so the refresh flag is cleared
/// in the same critical section that drains the queue
#[derive(Debug, Default)]
struct RefreshState {
    token: TokenState,
    refreshing: bool,
    queue: RequestQueue,
    /// Bumped whenever the session ends; a refresh started under an older
    /// generation must not restore the token
    generation: u64,
}

/// Session state of one context
pub struct SessionManager {
    store: StatusStore,
    api: Arc<dyn AuthApi>,
    clock: Arc<dyn Clock>,
    /// Full URL path of the protected endpoint
    protected_path: String,
    bot: Option<Arc<dyn BotVerifier>>,
    state: Mutex<RefreshState>,
    has_retrieved_initial_access_token: AtomicBool,
}

impl SessionManager {
    pub fn builder(store: StatusStore, api: Arc<dyn AuthApi>) -> SessionManagerBuilder {
        SessionManagerBuilder {
            store,
            api,
            clock: None,
            protected_path: "/graph".to_string(),
            bot: None,
        }
    }

    /// Current status as seen by every context
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.store.read()
    }

    #[must_use]
    pub fn store(&self) -> &StatusStore {
        &self.store
    }

    /// The access token held by this context, valid or not
    #[must_use]
    pub fn access_token(&self) -> Option<AccessToken> {
        self.lock_state().token.current().cloned()
    }

    /// Number of callers waiting on the in-flight refresh
    #[must_use]
    pub fn queued_waiters(&self) -> usize {
        self.lock_state().queue.len()
    }

    /// Reset the shared status on startup
    ///
    /// With `Loading` this wakes the bootstrap listener, which then tries to
    /// obtain a token from the refresh cookie.
    pub fn mount(&self, initial: SessionStatus) {
        self.store.reset(initial);
    }

    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hold `token` and publish `Authenticated`
    pub(crate) fn establish(&self, token: AccessToken) {
        let mut state = self.lock_state();
        debug!(token = %token.redacted(), expired_at = token.expired_at(), "storing access token");
        state.token.set(token);
        self.store.publish(SessionStatus::Authenticated);
    }

    /// End the session: forget the token, publish `Unauthenticated` and
    /// detach any in-flight refresh
    pub(crate) fn invalidate(&self) {
        let mut state = self.lock_state();
        state.generation += 1;
        state.token.clear();
        self.store.publish(SessionStatus::Unauthenticated);
        if state.refreshing {
            state.refreshing = false;
            state.queue.reject(&ClientError::SessionEnded);
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("protected_path", &self.protected_path)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RequestInterceptor for SessionManager {
    async fn intercept(&self, request: reqwest::Request) -> Result<reqwest::Request, ClientError> {
        self.prepare(request).await
    }
}

/// Builder for [`SessionManager`]
pub struct SessionManagerBuilder {
    store: StatusStore,
    api: Arc<dyn AuthApi>,
    clock: Option<Arc<dyn Clock>>,
    protected_path: String,
    bot: Option<Arc<dyn BotVerifier>>,
}

impl SessionManagerBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Full URL path requests must target to get a token attached
    pub fn protected_path(mut self, path: impl Into<String>) -> Self {
        self.protected_path = path.into();
        self
    }

    pub fn bot_verifier(mut self, verifier: Arc<dyn BotVerifier>) -> Self {
        self.bot = Some(verifier);
        self
    }

    pub fn build(self) -> SessionManager {
        SessionManager {
            store: self.store,
            api: self.api,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            protected_path: self.protected_path,
            bot: self.bot,
            state: Mutex::new(RefreshState::default()),
            has_retrieved_initial_access_token: AtomicBool::new(false),
        }
    }
}

impl NomdocClientBuilder {
    /// Register `manager` as the token-attaching interceptor
    pub fn session(self, manager: Arc<SessionManager>) -> Self {
        self.interceptor(manager)
    }
}

/// A session-bound client together with its session
#[derive(Clone)]
pub struct SessionHandle {
    /// Sends requests through the session interceptor
    pub client: NomdocClient,
    pub session: Arc<SessionManager>,
}

/// Wire a session to the API described by `config`
///
/// The session client and the token endpoint client share one cookie jar.
/// The bootstrap listener is not started; call
/// [`SessionManager::spawn_bootstrap`] before [`SessionManager::mount`].
pub fn connect(
    config: &SessionConfig,
    storage: Arc<dyn SharedStorage>,
    bot: Option<Arc<dyn BotVerifier>>,
) -> Result<SessionHandle, ClientError> {
    config
        .validate()
        .map_err(|e| ClientError::Configuration(e.to_string()))?;

    let base = NomdocClientBuilder::from_config(config).build()?;
    let api = Arc::new(OAuthClient::from_config(base.clone(), config));

    let mut builder = SessionManager::builder(StatusStore::new(storage), api)
        .protected_path(protected_url_path(base.base_url(), &config.protected_path)?);
    if let Some(bot) = bot {
        builder = builder.bot_verifier(bot);
    }
    let session = Arc::new(builder.build());
    let client = base.with_interceptor(session.clone());

    Ok(SessionHandle { client, session })
}

/// Path component of `base_url` joined with `path`
fn protected_url_path(base_url: &str, path: &str) -> Result<String, ClientError> {
    let base = url::Url::parse(base_url)
        .map_err(|e| ClientError::Configuration(format!("invalid base URL: {e}")))?;
    Ok(format!("{}{}", base.path().trim_end_matches('/'), path))
}
