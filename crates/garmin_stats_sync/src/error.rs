//! Custom error types for the sync application.

use thiserror::Error;

/// Sync application errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("API error: {0}")]
    Api(#[from] garmin_connect_client::GarminError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// The login retry budget ran out; the process should exit with
    /// [`SERVICE_UNAVAILABLE_EXIT`](crate::SERVICE_UNAVAILABLE_EXIT).
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            SyncError::Api(garmin_connect_client::GarminError::RetriesExhausted { .. })
        )
    }
}

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;
    use garmin_connect_client::GarminError;

    #[test]
    fn only_exhausted_retries_are_unreachable() {
        let exhausted = SyncError::from(GarminError::RetriesExhausted {
            attempts: 5,
            last: "timeout".into(),
        });
        assert!(exhausted.is_unreachable());
        assert!(!SyncError::from(GarminError::Config("x".into())).is_unreachable());
        assert!(!SyncError::Usage("x".into()).is_unreachable());
    }
}
