//! Credential error types.

use obs_crypto::CryptoError;
use thiserror::Error;

use crate::privilege::{PrivilegeLevel, PrivilegeSet};

/// Message shown to a credential holder for every verification failure.
const ACCESS_DENIED: &str = "access denied";

/// Errors that can occur while issuing or checking credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The issuance or verification request itself is invalid
    /// (empty or oversized bucket, empty or out-of-range privilege set).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The secure random source was unavailable during issuance.
    #[error("secure random source unavailable: {0}")]
    RandomnessFailure(String),

    /// The access key or secret key could not be decoded.
    #[error("malformed token: {0}")]
    MalformedToken(&'static str),

    /// The secret key decoded but its authentication tag does not match.
    #[error("authentication tag mismatch")]
    TagMismatch,

    /// The credential verified but does not grant the required level.
    #[error("insufficient privilege: required {required}, granted {granted}")]
    InsufficientPrivilege {
        /// Level the operation requires.
        required: PrivilegeLevel,
        /// Levels the credential carries.
        granted: PrivilegeSet,
    },

    /// Unexpected failure in a cryptographic primitive.
    #[error("crypto error: {0}")]
    Crypto(String),
}

/// How a failure should be surfaced outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// The caller sent an invalid request.
    BadRequest,
    /// The caller presented a credential that does not authorize the action.
    AccessDenied,
    /// The service could not complete the request.
    Internal,
}

impl FailureClass {
    /// HTTP status an API layer should answer with.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::AccessDenied => 403,
            Self::Internal => 500,
        }
    }
}

impl CredentialError {
    /// Classify this error for the outer API layer.
    #[must_use]
    pub fn class(&self) -> FailureClass {
        match self {
            Self::InvalidRequest(_) => FailureClass::BadRequest,
            Self::MalformedToken(_) | Self::TagMismatch | Self::InsufficientPrivilege { .. } => {
                FailureClass::AccessDenied
            },
            Self::RandomnessFailure(_) | Self::Crypto(_) => FailureClass::Internal,
        }
    }

    /// Whether the presented credential was rejected.
    ///
    /// True for malformed tokens and tag mismatches, which callers must
    /// treat identically.
    #[must_use]
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, Self::MalformedToken(_) | Self::TagMismatch)
    }

    /// Message safe to return to the credential holder.
    ///
    /// Malformed and forged tokens produce the same text so the response
    /// cannot be used as a forgery oracle.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::MalformedToken(_) | Self::TagMismatch => ACCESS_DENIED.to_owned(),
            Self::InsufficientPrivilege { required, .. } => {
                format!("{ACCESS_DENIED}: operation requires {required}")
            },
            Self::InvalidRequest(reason) => reason.clone(),
            Self::RandomnessFailure(_) | Self::Crypto(_) => "internal error".to_owned(),
        }
    }
}

impl From<CryptoError> for CredentialError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::RandomnessUnavailable(reason) => Self::RandomnessFailure(reason),
            other => Self::Crypto(other.to_string()),
        }
    }
}

/// Result type for credential operations.
pub type CredentialResult<T> = Result<T, CredentialError>;
