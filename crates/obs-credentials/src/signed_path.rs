//! Signed object paths.
//!
//! A signed path names one object in one bucket and carries its own tag:
//! `<key>?sig=<base64url tag>`. Whoever holds it can fetch that object
//! without the bucket's secret key.
//!
//! Signed material:
//! - 1 byte: domain (0x02, distinct from the token layout's version byte)
//! - 1 byte: bucket length, followed by the bucket bytes
//! - the object key bytes

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use obs_crypto::{AuthTag, MasterSecret};
use tracing::debug;

use crate::encoding::{MAX_BUCKET_LEN, bucket_len};
use crate::error::{CredentialError, CredentialResult};

/// Separator between the object key and its signature.
pub const SIGNATURE_PARAM: &str = "?sig=";

const SIGNED_PATH_DOMAIN: u8 = 0x02;

/// Signed material length before the key bytes, at most.
const MAX_PREFIX_LEN: usize = 2 + MAX_BUCKET_LEN;

/// Signs object keys for a bucket and checks signed paths.
#[derive(Clone)]
pub struct PathSigner {
    secret: Arc<MasterSecret>,
}

impl PathSigner {
    /// Create a signer sharing `secret`.
    #[must_use]
    pub fn new(secret: Arc<MasterSecret>) -> Self {
        Self { secret }
    }

    /// Produce the signed path for `key` in `bucket`.
    ///
    /// # Errors
    ///
    /// [`CredentialError::InvalidRequest`] if the bucket is empty or too
    /// long, or the key is empty.
    pub fn sign(&self, bucket: &str, key: &str) -> CredentialResult<String> {
        let tag = self.tag(bucket, key)?;
        Ok(format!(
            "{key}{SIGNATURE_PARAM}{}",
            URL_SAFE_NO_PAD.encode(tag.as_bytes())
        ))
    }

    /// Check a signed path presented for `bucket` and return the object key.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::InvalidRequest`] for an empty or oversized bucket.
    /// - [`CredentialError::MalformedToken`] if the path has no signature or
    ///   it does not decode.
    /// - [`CredentialError::TagMismatch`] if the signature does not cover
    ///   this bucket and key.
    pub fn verify<'a>(&self, bucket: &str, signed: &'a str) -> CredentialResult<&'a str> {
        bucket_len(bucket)?;

        let (key, encoded) = signed
            .rsplit_once(SIGNATURE_PARAM)
            .ok_or(CredentialError::MalformedToken("path carries no signature"))?;
        let presented = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| CredentialError::MalformedToken("path signature is not valid base64url"))
            .and_then(|bytes| {
                AuthTag::try_from_slice(&bytes).map_err(|_| {
                    CredentialError::MalformedToken("path signature has the wrong length")
                })
            })?;

        let expected = self.tag(bucket, key).map_err(|e| match e {
            CredentialError::InvalidRequest(_) => {
                CredentialError::MalformedToken("path names no object")
            },
            other => other,
        })?;
        if !expected.verify(&presented) {
            debug!(bucket, "signed path tag mismatch");
            return Err(CredentialError::TagMismatch);
        }
        Ok(key)
    }

    fn tag(&self, bucket: &str, key: &str) -> CredentialResult<AuthTag> {
        let len = bucket_len(bucket)?;
        if key.is_empty() {
            return Err(CredentialError::InvalidRequest(
                "object key must not be empty".to_owned(),
            ));
        }

        let mut data = Vec::with_capacity(MAX_PREFIX_LEN.saturating_add(key.len()));
        data.push(SIGNED_PATH_DOMAIN);
        data.push(len);
        data.extend_from_slice(bucket.as_bytes());
        data.extend_from_slice(key.as_bytes());
        Ok(self.secret.tag(&data)?)
    }
}

impl std::fmt::Debug for PathSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathSigner")
            .field("key_id", &self.secret.key_id_hex())
            .finish_non_exhaustive()
    }
}
