//! Byte layout and textual encoding of capability tokens.
//!
//! Signed material (v1):
//! - 1 byte: version (0x01)
//! - 16 bytes: access key
//! - 1 byte: bucket length, followed by the bucket bytes (at most 255)
//! - 1 byte: privilege bitmask
//! - 12 bytes: nonce
//!
//! The secret key carries only `bitmask ∥ nonce ∥ tag` (29 bytes), rendered
//! as URL-safe unpadded base64. The bucket is never stored in the secret key;
//! the verifier receives it out of band and feeds it into the tag, so a key
//! issued for one bucket cannot be replayed against another.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use obs_crypto::{AuthTag, TAG_LEN};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CredentialError, CredentialResult};
use crate::privilege::PrivilegeSet;

/// Length of an access key in bytes.
pub const ACCESS_KEY_LEN: usize = 16;

/// Length of the per-issuance nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Length of the decoded secret key payload: bitmask, nonce and tag.
pub const SECRET_KEY_PAYLOAD_LEN: usize = 29;

/// Maximum bucket name length that fits the one-byte length prefix.
pub const MAX_BUCKET_LEN: usize = 255;

/// Version of the signed material layout.
/// Increment this when the layout changes.
const SIGNING_DATA_VERSION: u8 = 0x01;

/// Offset of the tag inside the secret key payload.
const TAG_OFFSET: usize = 1 + NONCE_LEN;

/// Upper bound on the signed material length.
const MAX_SIGNING_DATA_LEN: usize = 1 + ACCESS_KEY_LEN + 1 + MAX_BUCKET_LEN + 1 + NONCE_LEN;

const _: () = assert!(SECRET_KEY_PAYLOAD_LEN == TAG_OFFSET + TAG_LEN);

/// Public identifier of a credential. Safe to log.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessKey([u8; ACCESS_KEY_LEN]);

impl AccessKey {
    /// Create from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; ACCESS_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ACCESS_KEY_LEN] {
        &self.0
    }

    /// Encode as lowercase hex (32 characters).
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for AccessKey {
    type Err = CredentialError;

    fn from_str(s: &str) -> CredentialResult<Self> {
        let mut bytes = [0u8; ACCESS_KEY_LEN];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| CredentialError::MalformedToken("access key is not 32 hex characters"))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessKey({})", self.to_hex())
    }
}

impl Serialize for AccessKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for AccessKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Opaque bearer string handed to the credential holder.
///
/// Zeroized on drop and redacted from `Debug`. There is no `Display`
/// implementation so it cannot end up in a log line by accident.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(String);

impl SecretKey {
    /// Wrap an encoded secret key string.
    #[must_use]
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// The encoded string (careful - sensitive!).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the encoded string out, leaving this value empty.
    #[must_use]
    pub fn into_string(mut self) -> String {
        std::mem::take(&mut self.0)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***)")
    }
}

/// A secret key split back into its fields.
#[derive(Debug, Clone, Copy)]
pub struct DecodedSecretKey {
    /// Granted privileges, not yet authenticated.
    pub privileges: PrivilegeSet,
    /// Issuance nonce.
    pub nonce: [u8; NONCE_LEN],
    /// Authentication tag to check.
    pub tag: AuthTag,
}

/// Check that a bucket name fits the signed layout and return its length byte.
///
/// # Errors
///
/// Returns [`CredentialError::InvalidRequest`] if the name is empty or longer
/// than 255 bytes.
pub fn bucket_len(bucket: &str) -> CredentialResult<u8> {
    if bucket.is_empty() {
        return Err(CredentialError::InvalidRequest(
            "bucket name must not be empty".to_owned(),
        ));
    }
    u8::try_from(bucket.len()).map_err(|_| {
        CredentialError::InvalidRequest(format!(
            "bucket name is {} bytes, exceeding the {MAX_BUCKET_LEN} byte limit",
            bucket.len()
        ))
    })
}

/// Build the byte string that the authentication tag covers.
///
/// # Errors
///
/// Returns [`CredentialError::InvalidRequest`] if the bucket name is empty or
/// too long.
pub fn signing_data(
    access_key: &AccessKey,
    bucket: &str,
    privileges: PrivilegeSet,
    nonce: &[u8; NONCE_LEN],
) -> CredentialResult<Vec<u8>> {
    let len = bucket_len(bucket)?;

    let mut data = Vec::with_capacity(MAX_SIGNING_DATA_LEN);
    data.push(SIGNING_DATA_VERSION);
    data.extend_from_slice(access_key.as_bytes());
    data.push(len);
    data.extend_from_slice(bucket.as_bytes());
    data.push(privileges.bits());
    data.extend_from_slice(nonce);
    Ok(data)
}

/// Render `bitmask ∥ nonce ∥ tag` as a secret key string.
#[must_use]
pub fn encode_secret_key(
    privileges: PrivilegeSet,
    nonce: &[u8; NONCE_LEN],
    tag: &AuthTag,
) -> SecretKey {
    let mut payload = [0u8; SECRET_KEY_PAYLOAD_LEN];
    payload[0] = privileges.bits();
    payload[1..=NONCE_LEN].copy_from_slice(nonce);
    payload[TAG_OFFSET..].copy_from_slice(tag.as_bytes());
    SecretKey(URL_SAFE_NO_PAD.encode(payload))
}

/// Split a secret key string back into its fields.
///
/// The privileges are decoded but not authenticated; only a matching tag
/// makes them trustworthy.
///
/// # Errors
///
/// Returns [`CredentialError::MalformedToken`] on invalid characters, wrong
/// length, an empty privilege set, or undefined privilege bits. Never panics.
pub fn decode_secret_key(encoded: &str) -> CredentialResult<DecodedSecretKey> {
    let payload = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| CredentialError::MalformedToken("secret key is not valid base64url"))?;

    if payload.len() != SECRET_KEY_PAYLOAD_LEN {
        return Err(CredentialError::MalformedToken("secret key has the wrong length"));
    }

    let privileges = PrivilegeSet::from_bits(payload[0])
        .ok_or(CredentialError::MalformedToken("secret key has undefined privilege bits"))?;
    if privileges.is_empty() {
        return Err(CredentialError::MalformedToken("secret key grants nothing"));
    }

    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&payload[1..=NONCE_LEN]);
    let tag = AuthTag::try_from_slice(&payload[TAG_OFFSET..])
        .map_err(|_| CredentialError::MalformedToken("secret key has the wrong length"))?;

    Ok(DecodedSecretKey {
        privileges,
        nonce,
        tag,
    })
}
