//! Token attachment and single-flight refresh

use super::SessionManager;
use super::queue::RefreshOutcome;
use crate::client::error::ClientError;
use crate::types::TokenGrant;
use http::header::{AUTHORIZATION, HeaderValue};
use nomdoc_core::{AccessToken, SessionStatus};
use tokio::sync::oneshot;

enum Next {
    PassThrough,
    Attach(AccessToken),
    Wait(oneshot::Receiver<RefreshOutcome>),
    Refresh { generation: u64 },
}

impl SessionManager {
    /// Attach the access token to requests for the protected endpoint,
    /// refreshing it first when it has expired
    pub(crate) async fn prepare(
        &self,
        mut request: reqwest::Request,
    ) -> Result<reqwest::Request, ClientError> {
        if request.url().path() != self.protected_path {
            return Ok(request);
        }

        let token = match self.next_step() {
            Next::PassThrough => return Ok(request),
            Next::Attach(token) => token,
            Next::Wait(rx) => rx.await.map_err(|_| ClientError::RefreshAborted)??,
            Next::Refresh { generation } => self.refresh(generation).await?,
        };

        let value = HeaderValue::from_str(&token.bearer())
            .map_err(|e| ClientError::Configuration(format!("invalid access token: {e}")))?;
        request.headers_mut().insert(AUTHORIZATION, value);
        Ok(request)
    }

    fn next_step(&self) -> Next {
        let mut state = self.lock_state();
        let Some(token) = state.token.current() else {
            return Next::PassThrough;
        };
        if self.store.read() != SessionStatus::Authenticated {
            return Next::PassThrough;
        }
        if token.is_valid_at(self.clock.now_unix()) {
            debug!(token = %token.redacted(), "attaching access token");
            return Next::Attach(token.clone());
        }
        if state.refreshing {
            return Next::Wait(state.queue.push());
        }
        state.refreshing = true;
        Next::Refresh {
            generation: state.generation,
        }
    }

    async fn refresh(&self, generation: u64) -> Result<AccessToken, ClientError> {
        debug!("access token expired, refreshing");
        let guard = RefreshGuard {
            manager: self,
            generation,
            armed: true,
        };
        let outcome = self.api.exchange(TokenGrant::RefreshToken).await;
        guard.complete(outcome.map(|response| response.access_token()))
    }
}

/// Owns the refresh flag for the duration of one exchange
///
/// Dropping it before [`RefreshGuard::complete`] releases the flag and fails
/// every queued caller with [`ClientError::RefreshAborted`]. Once the session
/// has ended the guard no longer owns the flag, and its outcome is discarded.
struct RefreshGuard<'a> {
    manager: &'a SessionManager,
    generation: u64,
    armed: bool,
}

impl RefreshGuard<'_> {
    fn complete(mut self, outcome: RefreshOutcome) -> RefreshOutcome {
        self.armed = false;
        let manager = self.manager;
        let mut state = manager.lock_state();

        if state.generation != self.generation {
            // Waiters were already rejected when the session ended
            debug!("discarding refresh outcome of an ended session");
            return Err(ClientError::SessionEnded);
        }

        match &outcome {
            Ok(token) => {
                state.token.set(token.clone());
                manager.store.publish(SessionStatus::Authenticated);
                state.queue.resolve(token);
                debug!(token = %token.redacted(), "access token refreshed");
            }
            Err(err) => {
                warn!(error = %err, "access token refresh failed");
                state.token.clear();
                manager.store.publish(SessionStatus::Unauthenticated);
                state.queue.reject(err);
            }
        }
        state.refreshing = false;
        outcome
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.manager.lock_state();
        if state.generation != self.generation {
            return;
        }
        state.refreshing = false;
        let aborted = state.queue.reject(&ClientError::RefreshAborted);
        warn!(aborted, "token refresh dropped before completion");
    }
}
