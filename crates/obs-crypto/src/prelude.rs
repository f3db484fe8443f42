//! Prelude module - commonly used types for convenient import.
//!
//! Use `use obs_crypto::prelude::*;` to import all essential types.

// Errors
pub use crate::{CryptoError, CryptoResult};

// Keys and tags
pub use crate::{AuthTag, MasterSecret};

// Randomness
pub use crate::{EntropySource, OsEntropy};
