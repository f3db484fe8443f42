//! Secure randomness for access keys, nonces and freshly generated secrets.
//!
//! Issuance never falls back to a weaker source: if the operating system
//! generator cannot be read the caller gets
//! [`CryptoError::RandomnessUnavailable`].

use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{CryptoError, CryptoResult};

/// A source of cryptographically secure random bytes.
pub trait EntropySource: Send + Sync {
    /// Fill `dest` entirely with random bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::RandomnessUnavailable`] if the source cannot
    /// produce bytes.
    fn fill(&self, dest: &mut [u8]) -> CryptoResult<()>;
}

/// The operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> CryptoResult<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| CryptoError::RandomnessUnavailable(e.to_string()))
    }
}

/// Fill a fixed-size array from a trait-object entropy source.
///
/// # Errors
///
/// Propagates any failure from the source.
pub fn random_array<const N: usize>(source: &dyn EntropySource) -> CryptoResult<[u8; N]> {
    let mut out = [0u8; N];
    source.fill(&mut out)?;
    Ok(out)
}
