//! Verification of presented capability tokens.

use std::sync::Arc;

use obs_crypto::MasterSecret;
use tracing::debug;

use crate::decision;
use crate::encoding::{self, AccessKey};
use crate::error::{CredentialError, CredentialResult};
use crate::privilege::{PrivilegeLevel, PrivilegeSet};

/// Checks `(bucket, access key, secret key)` triples against the master secret.
///
/// Verification is a pure function of its inputs and the secret; there is
/// no registry of issued credentials to consult.
#[derive(Clone)]
pub struct TokenVerifier {
    secret: Arc<MasterSecret>,
}

impl TokenVerifier {
    /// Create a verifier sharing `secret`.
    #[must_use]
    pub fn new(secret: Arc<MasterSecret>) -> Self {
        Self { secret }
    }

    /// Verify a credential for `bucket` and recover the privileges it grants.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::InvalidRequest`] if `bucket` is empty or longer
    ///   than 255 bytes.
    /// - [`CredentialError::MalformedToken`] if either key fails to decode.
    /// - [`CredentialError::TagMismatch`] if the tag does not match, which
    ///   includes credentials presented for the wrong bucket.
    pub fn verify(
        &self,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
    ) -> CredentialResult<PrivilegeSet> {
        encoding::bucket_len(bucket)?;

        let ak: AccessKey = access_key.parse()?;
        let decoded = encoding::decode_secret_key(secret_key)?;

        let data = encoding::signing_data(&ak, bucket, decoded.privileges, &decoded.nonce)?;
        let expected = self.secret.tag(&data)?;

        if !expected.verify(&decoded.tag) {
            debug!(bucket, access_key = %ak, "credential tag mismatch");
            return Err(CredentialError::TagMismatch);
        }

        Ok(decoded.privileges)
    }

    /// Verify a credential and require that it grants at least `required`.
    ///
    /// # Errors
    ///
    /// Everything [`verify`](Self::verify) returns, plus
    /// [`CredentialError::InsufficientPrivilege`] when the credential is
    /// genuine but too weak.
    pub fn authorize(
        &self,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
        required: PrivilegeLevel,
    ) -> CredentialResult<PrivilegeSet> {
        let granted = self.verify(bucket, access_key, secret_key)?;
        decision::require(granted, required)?;
        Ok(granted)
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("key_id", &self.secret.key_id_hex())
            .finish()
    }
}
