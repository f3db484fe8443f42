//! Prelude module - commonly used types for convenient import.
//!
//! Use `use obs_credentials::prelude::*;` to import all essential types.

// Errors
pub use crate::{CredentialError, CredentialResult, FailureClass};

// Privileges and decisions
pub use crate::{AccessDecision, PrivilegeLevel, PrivilegeSet, authorize};

// Tokens
pub use crate::{AccessKey, CapabilityToken, Credentials, SecretKey, TokenBuilder};

// Issuance and verification
pub use crate::{PathSigner, TokenIssuer, TokenVerifier};
