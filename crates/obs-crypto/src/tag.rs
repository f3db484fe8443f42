//! Truncated HMAC-SHA-256 authentication tags.

use std::fmt;

use subtle::ConstantTimeEq;

use crate::error::{CryptoError, CryptoResult};

/// Length of an authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// A 16-byte authentication tag (HMAC-SHA-256 truncated).
///
/// There is intentionally no `PartialEq` implementation. Tags are compared
/// with [`AuthTag::verify`], which runs in constant time.
#[derive(Clone, Copy)]
pub struct AuthTag([u8; TAG_LEN]);

impl AuthTag {
    /// Create from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; TAG_LEN]) -> Self {
        Self(bytes)
    }

    /// Try to create from a slice.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidTagLength`] if the slice is not exactly
    /// 16 bytes.
    pub fn try_from_slice(slice: &[u8]) -> CryptoResult<Self> {
        let bytes: [u8; TAG_LEN] =
            slice
                .try_into()
                .map_err(|_| CryptoError::InvalidTagLength {
                    expected: TAG_LEN,
                    actual: slice.len(),
                })?;
        Ok(Self(bytes))
    }

    /// Get the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; TAG_LEN] {
        &self.0
    }

    /// Compare against another tag without short-circuiting.
    #[must_use]
    pub fn verify(&self, other: &Self) -> bool {
        bool::from(self.0.ct_eq(&other.0))
    }
}

impl fmt::Debug for AuthTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthTag(..)")
    }
}
