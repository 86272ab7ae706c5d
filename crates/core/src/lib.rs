//! Nomdoc session core types and utilities

pub mod clock;
pub mod config;
pub mod error;
pub mod status;
pub mod storage;
pub mod store;
pub mod token;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CookieConfig, SessionConfig};
pub use error::{CoreError, CoreResult};
pub use status::{SESSION_STATUS_STORAGE_KEY, SessionStatus};
pub use storage::{MemoryStorage, SharedStorage, StorageEvent};
pub use store::{StatusChange, StatusStore, StatusSubscription};
pub use token::{AccessToken, TokenState};
pub use validation::{FieldError, ValidationError, is_validation_error};
