//! Issuance of new capability tokens.

use std::sync::Arc;

use obs_crypto::{EntropySource, MasterSecret, OsEntropy, random_array};
use tracing::debug;

use crate::encoding::{self, ACCESS_KEY_LEN, AccessKey, NONCE_LEN};
use crate::error::{CredentialError, CredentialResult};
use crate::privilege::{PrivilegeLevel, PrivilegeSet};
use crate::token::CapabilityToken;

/// Builds new credentials for a bucket and privilege set.
///
/// Holds only a shared read-only reference to the master secret, so one
/// issuer can serve any number of concurrent callers.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Arc<MasterSecret>,
    entropy: Arc<dyn EntropySource>,
}

impl TokenIssuer {
    /// Create an issuer backed by the OS random source.
    #[must_use]
    pub fn new(secret: Arc<MasterSecret>) -> Self {
        Self::with_entropy(secret, Arc::new(OsEntropy))
    }

    /// Create an issuer with a specific random source.
    #[must_use]
    pub fn with_entropy(secret: Arc<MasterSecret>, entropy: Arc<dyn EntropySource>) -> Self {
        Self { secret, entropy }
    }

    /// Issue a token for `bucket` granting `privileges`.
    ///
    /// A fresh access key and nonce are drawn for every call, so two
    /// issuances with identical inputs still produce different secrets.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::InvalidRequest`] if `privileges` is empty or the
    ///   bucket is empty or longer than 255 bytes.
    /// - [`CredentialError::RandomnessFailure`] if the random source fails.
    pub fn issue(&self, bucket: &str, privileges: PrivilegeSet) -> CredentialResult<CapabilityToken> {
        if privileges.is_empty() {
            return Err(CredentialError::InvalidRequest(
                "at least one action must be granted".to_owned(),
            ));
        }
        encoding::bucket_len(bucket)?;

        let access_key = AccessKey::from_bytes(random_array::<ACCESS_KEY_LEN>(self.entropy.as_ref())?);
        let nonce = random_array::<NONCE_LEN>(self.entropy.as_ref())?;

        let data = encoding::signing_data(&access_key, bucket, privileges, &nonce)?;
        let tag = self.secret.tag(&data)?;
        let secret_key = encoding::encode_secret_key(privileges, &nonce, &tag);

        debug!(
            bucket,
            access_key = %access_key,
            privileges = %privileges,
            "issued bucket credential"
        );

        Ok(CapabilityToken {
            bucket: bucket.to_owned(),
            access_key,
            secret_key,
        })
    }

    /// Issue a token from a sequence of requested actions.
    ///
    /// # Errors
    ///
    /// See [`issue`](Self::issue).
    pub fn issue_actions(
        &self,
        bucket: &str,
        actions: impl IntoIterator<Item = PrivilegeLevel>,
    ) -> CredentialResult<CapabilityToken> {
        self.issue(bucket, actions.into_iter().collect())
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("key_id", &self.secret.key_id_hex())
            .finish_non_exhaustive()
    }
}
