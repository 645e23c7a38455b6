//! Error types for user record access.

use derive_more::{Display, Error};
use tracing::{instrument, warn};

/// Broad category of a [`UserError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum UserErrorKind {
    /// The caller supplied a missing or malformed argument.
    #[display("invalid argument")]
    InvalidArgument,
    /// The backing store could not serve the request.
    #[display("store unavailable")]
    StoreUnavailable,
}

/// User record error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("User error ({}): {} at {}:{}", kind, message, file, line)]
pub struct UserError {
    /// Error category.
    pub kind: UserErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl UserError {
    /// Creates a new user error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: UserErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Shorthand for an [`UserErrorKind::InvalidArgument`] error.
    #[track_caller]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(UserErrorKind::InvalidArgument, message)
    }

    /// Shorthand for a [`UserErrorKind::StoreUnavailable`] error.
    #[track_caller]
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(UserErrorKind::StoreUnavailable, message)
    }

    /// Returns the error category.
    pub fn kind(&self) -> UserErrorKind {
        self.kind
    }
}

/// Backing store error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Store error: {} at {}:{}", message, file, line)]
pub struct StoreError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// Creates a new store error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        let message = message.into();
        warn!(error_message = %message, "Store error created");
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

// Store failures surface to callers unchanged, only re-categorised.
impl From<StoreError> for UserError {
    fn from(err: StoreError) -> Self {
        Self {
            kind: UserErrorKind::StoreUnavailable,
            message: err.message,
            line: err.line,
            file: err.file,
        }
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for StoreError {
    #[track_caller]
    fn from(err: redis::RedisError) -> Self {
        Self::new(format!("Redis error: {}", err))
    }
}
