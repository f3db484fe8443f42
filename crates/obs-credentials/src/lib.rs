//! OBS Credentials - Stateless bucket-scoped capability tokens.
//!
//! This crate provides:
//! - Ordered privilege levels and privilege sets
//! - Issuance of access-key / secret-key pairs bound to one bucket
//! - Verification that recovers the granted privileges without any lookup
//! - Allow/deny decisions over verified privilege sets
//! - Signed object paths that stand in for a credential on one object
//!
//! # Security Model
//!
//! Every secret key carries:
//! - The granted privilege bitmask
//! - A fresh random nonce
//! - An HMAC-SHA256 tag (truncated to 16 bytes) over the access key, bucket,
//!   bitmask and nonce, keyed by the master secret
//!
//! Tags are compared in constant time. Malformed and forged keys are
//! reported to the credential holder with the same message.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use obs_credentials::{PrivilegeLevel, TokenBuilder, TokenIssuer, TokenVerifier, authorize};
//! use obs_crypto::MasterSecret;
//!
//! let secret = Arc::new(MasterSecret::generate().unwrap());
//! let issuer = TokenIssuer::new(Arc::clone(&secret));
//! let verifier = TokenVerifier::new(secret);
//!
//! let token = TokenBuilder::new("bucket-a")
//!     .action(PrivilegeLevel::Delete)
//!     .issue(&issuer)
//!     .unwrap();
//! let creds = token.credentials();
//!
//! let granted = verifier.verify("bucket-a", &creds.ak, &creds.sk).unwrap();
//! assert!(authorize(granted, PrivilegeLevel::Read));
//! assert!(verifier.verify("bucket-b", &creds.ak, &creds.sk).is_err());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod encoding;
pub mod prelude;

mod decision;
mod error;
mod issuer;
mod privilege;
mod signed_path;
mod token;
mod verifier;

pub use decision::{AccessDecision, authorize, require};
pub use encoding::{AccessKey, SecretKey};
pub use error::{CredentialError, CredentialResult, FailureClass};
pub use issuer::TokenIssuer;
pub use privilege::{PrivilegeLevel, PrivilegeSet};
pub use signed_path::{PathSigner, SIGNATURE_PARAM};
pub use token::{CapabilityToken, Credentials, TokenBuilder};
pub use verifier::TokenVerifier;
