use std::path::PathBuf;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `off` was called for a key that has no subscription list.
    #[error("no subscriptions for key: {key}")]
    SubscriptionNotFound { key: String },

    /// `off` was called with a callback that is not registered under the key.
    #[error("subscriber not registered for key: {key}")]
    SubscriberNotRegistered { key: String },

    /// The persisted store file does not exist.
    #[error("store file not found: {}", .0.display())]
    StoreNotFound(PathBuf),

    /// I/O error from the storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted record could not be decoded.
    #[error("corrupt store file {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    /// The cache or record could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The store configuration is invalid or the path cannot be resolved.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Returns `true` for every not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SubscriptionNotFound { .. }
                | Self::SubscriberNotRegistered { .. }
                | Self::StoreNotFound(_)
        )
    }
}

impl From<stash_hash::HasherError> for StoreError {
    fn from(e: stash_hash::HasherError) -> Self {
        match e {
            stash_hash::HasherError::Serialization(msg) => Self::Serialization(msg),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
