//! Issued credentials and the builder that requests them.
//!
//! A token is never stored server-side. The `(bucket, access key, secret
//! key)` triple returned here is the only record of the grant; losing it
//! means losing the credential.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::encoding::{AccessKey, SecretKey};
use crate::error::CredentialResult;
use crate::issuer::TokenIssuer;
use crate::privilege::{PrivilegeLevel, PrivilegeSet};

/// A freshly issued credential scoped to one bucket.
#[derive(Debug, Clone)]
pub struct CapabilityToken {
    /// Bucket the credential is scoped to.
    pub bucket: String,
    /// Public identifier, safe to log.
    pub access_key: AccessKey,
    /// Bearer secret; encodes the privileges and the authentication tag.
    pub secret_key: SecretKey,
}

impl CapabilityToken {
    /// The `{ak, sk}` pair delivered to the client.
    ///
    /// The returned `sk` is a plain copy and is not wiped when dropped.
    /// Call [`Zeroize::zeroize`] on the result once it has been written
    /// out if it must not linger in memory.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials {
            ak: self.access_key.to_hex(),
            sk: self.secret_key.as_str().to_owned(),
        }
    }
}

/// Access key / secret key pair as exchanged with clients.
///
/// Serialized as `{"ak": "...", "sk": "..."}`. Unlike [`SecretKey`] this is
/// not wiped on drop, so fields can be moved out; wipe it with
/// [`Zeroize::zeroize`] when done.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
pub struct Credentials {
    /// Access key (hex).
    pub ak: String,
    /// Secret key (base64url).
    pub sk: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("ak", &self.ak)
            .field("sk", &"***")
            .finish()
    }
}

/// Accumulates requested actions for a bucket, then issues a token.
#[derive(Debug, Clone)]
pub struct TokenBuilder {
    bucket: String,
    privileges: PrivilegeSet,
}

impl TokenBuilder {
    /// Start a request for `bucket`.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            privileges: PrivilegeSet::new(),
        }
    }

    /// Add one action.
    #[must_use]
    pub fn action(mut self, level: PrivilegeLevel) -> Self {
        self.privileges.insert(level);
        self
    }

    /// Add several actions.
    #[must_use]
    pub fn actions(mut self, levels: impl IntoIterator<Item = PrivilegeLevel>) -> Self {
        self.privileges.extend(levels);
        self
    }

    /// Privileges requested so far.
    #[must_use]
    pub fn privileges(&self) -> PrivilegeSet {
        self.privileges
    }

    /// Issue the token.
    ///
    /// # Errors
    ///
    /// See [`TokenIssuer::issue`].
    pub fn issue(self, issuer: &TokenIssuer) -> CredentialResult<CapabilityToken> {
        issuer.issue(&self.bucket, self.privileges)
    }
}
