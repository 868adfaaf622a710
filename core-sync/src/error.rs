use bridge_traits::error::BridgeError;
use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    /// The federation source could not be read
    #[error("Source fetch failed: {0}")]
    Source(#[from] BridgeError),

    /// A reference required to link records could not be resolved
    #[error("Missing reference for {entity}: {detail}")]
    MissingReference { entity: String, detail: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Sync already in progress (held by {holder})")]
    SyncInProgress { holder: String },

    /// The run outlived its lease and another run took the lock over
    #[error("Run lock '{lock}' lost during the run")]
    LeaseLost { lock: String },

    #[error("Sync is disabled by configuration")]
    Disabled,
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_wraps_bridge_error() {
        let error: SyncError = BridgeError::SourceUnavailable("HTTP 503".to_string()).into();
        assert!(matches!(error, SyncError::Source(_)));
        assert_eq!(error.to_string(), "Source fetch failed: Remote source error: HTTP 503");
    }
}
