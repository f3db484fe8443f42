use obs_credentials::CredentialError;
use thiserror::Error;

/// Storage service errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Bucket name breaks the naming rules.
    #[error("invalid bucket name '{name}': {reason}")]
    InvalidBucketName {
        /// The rejected name.
        name: String,
        /// Which rule it broke.
        reason: &'static str,
    },

    /// Bucket directory does not exist.
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    /// Object does not exist in the bucket.
    #[error("object not found: {bucket}/{key}")]
    ObjectNotFound {
        /// Bucket searched.
        bucket: String,
        /// Object key requested.
        key: String,
    },

    /// Object key resolves outside the bucket or through a symlink.
    #[error("path resolves outside bucket boundaries: {0}")]
    PathViolation(String),

    /// Credential issuance or verification failed.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Native IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// HTTP status an API layer should answer with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidBucketName { .. } | Self::PathViolation(_) => 400,
            Self::BucketNotFound(_) | Self::ObjectNotFound { .. } => 404,
            Self::Credential(e) => e.class().status_code(),
            Self::Io(_) => 500,
        }
    }

    /// Message safe to return to the caller.
    ///
    /// Credential failures use [`CredentialError::public_message`], so a
    /// forged key and a garbled one read the same.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Credential(e) => e.public_message(),
            Self::Io(_) => "internal error".to_owned(),
            other => other.to_string(),
        }
    }
}

/// Convenience result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(StorageError::BucketNotFound("b".into()).status_code(), 404);
        assert_eq!(StorageError::PathViolation("..".into()).status_code(), 400);
        assert_eq!(
            StorageError::from(CredentialError::TagMismatch).status_code(),
            403
        );
        assert_eq!(
            StorageError::from(CredentialError::RandomnessFailure("x".into())).status_code(),
            500
        );
        assert_eq!(
            StorageError::from(std::io::Error::other("disk")).status_code(),
            500
        );
    }

    #[test]
    fn test_public_message_hides_details() {
        let forged = StorageError::from(CredentialError::TagMismatch);
        let garbled = StorageError::from(CredentialError::MalformedToken("bad base64"));
        assert_eq!(forged.public_message(), garbled.public_message());

        let io = StorageError::from(std::io::Error::other("/secret/path unreadable"));
        assert!(!io.public_message().contains("/secret/path"));
    }
}
