//! Nomdoc HTTP client with transparent access-token handling
//!
//! Every request sent through a [`client::NomdocClient`] passes its
//! registered interceptors. The [`session::SessionManager`] is one such
//! interceptor: it attaches the access token to requests for the protected
//! endpoint and refreshes an expired token, serialising concurrent refreshes
//! behind a single in-flight exchange.

#[macro_use]
extern crate tracing;

pub mod bot;
pub mod client;
pub mod session;
pub mod types;

pub use client::error::{ClientError, ErrorKind, PreconditionError};
pub use client::{NomdocClient, NomdocClientBuilder};
pub use session::{SessionHandle, SessionManager, connect};
