//! obs Crypto - Primitives behind stateless bucket credentials.
//!
//! This crate provides:
//! - The process-wide [`MasterSecret`] with secure memory handling
//! - Truncated HMAC-SHA-256 [`AuthTag`]s compared in constant time
//! - An [`EntropySource`] abstraction over the OS CSPRNG
//!
//! # Example
//!
//! ```
//! use obs_crypto::MasterSecret;
//!
//! let secret = MasterSecret::generate().unwrap();
//!
//! let tag = secret.tag(b"bucket-a").unwrap();
//! assert!(tag.verify(&secret.tag(b"bucket-a").unwrap()));
//! assert!(!tag.verify(&secret.tag(b"bucket-b").unwrap()));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod entropy;
mod error;
mod secret;
mod tag;

pub use entropy::{EntropySource, OsEntropy, random_array};
pub use error::{CryptoError, CryptoResult};
pub use secret::{MASTER_SECRET_LEN, MasterSecret};
pub use tag::{AuthTag, TAG_LEN};
