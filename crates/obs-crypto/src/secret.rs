//! The process-wide master secret used to key authentication tags.
//!
//! The secret is loaded once at start-up and shared read-only (usually behind
//! an `Arc`) by every issuer and verifier. Compromise of this value
//! invalidates every credential ever issued under it.

use std::io::Write;
use std::path::Path;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::entropy::{EntropySource, OsEntropy};
use crate::error::{CryptoError, CryptoResult};
use crate::tag::{AuthTag, TAG_LEN};

/// Length of the master secret in bytes.
pub const MASTER_SECRET_LEN: usize = 32;

type HmacSha256 = Hmac<Sha256>;

/// A 32-byte signing key with secure memory handling.
///
/// The bytes are zeroized on drop and never appear in `Debug` output.
#[derive(ZeroizeOnDrop)]
pub struct MasterSecret {
    bytes: [u8; MASTER_SECRET_LEN],
}

impl MasterSecret {
    /// Generate a new random secret from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::RandomnessUnavailable`] if the OS generator
    /// cannot be read.
    pub fn generate() -> CryptoResult<Self> {
        Self::generate_with(&OsEntropy)
    }

    /// Generate a new random secret from the given entropy source.
    ///
    /// # Errors
    ///
    /// Propagates any failure from the source.
    pub fn generate_with(source: &dyn EntropySource) -> CryptoResult<Self> {
        let mut bytes = [0u8; MASTER_SECRET_LEN];
        source.fill(&mut bytes)?;
        Ok(Self { bytes })
    }

    /// Create from raw secret bytes (32 bytes).
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if the slice is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != MASTER_SECRET_LEN {
            return Err(CryptoError::InvalidKeyLength {
                expected: MASTER_SECRET_LEN,
                actual: bytes.len(),
            });
        }

        let mut secret = [0u8; MASTER_SECRET_LEN];
        secret.copy_from_slice(bytes);
        Ok(Self { bytes: secret })
    }

    /// Decode from a standard base64 string (as stored in configuration).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid base64 or not 32 bytes.
    pub fn from_base64(s: &str) -> CryptoResult<Self> {
        use base64::Engine;
        let bytes = Zeroizing::new(
            base64::engine::general_purpose::STANDARD
                .decode(s.trim())
                .map_err(|_| CryptoError::InvalidBase64Encoding)?,
        );
        Self::from_bytes(&bytes)
    }

    /// Encode as a standard base64 string (careful - sensitive!).
    #[must_use]
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(self.bytes)
    }

    /// Get a short key ID (first 8 bytes of the SHA-256 of the secret).
    ///
    /// Safe to log: it identifies which secret is in use without revealing it.
    #[must_use]
    pub fn key_id(&self) -> [u8; 8] {
        let digest = Sha256::digest(self.bytes);
        let mut id = [0u8; 8];
        id.copy_from_slice(&digest[..8]);
        id
    }

    /// Get the key ID as a hex string.
    #[must_use]
    pub fn key_id_hex(&self) -> String {
        hex::encode(self.key_id())
    }

    /// Compute the authentication tag of `message`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] if the HMAC key cannot be
    /// initialized. HMAC accepts keys of any length, so this does not happen
    /// with a well-formed secret.
    pub fn tag(&self, message: &[u8]) -> CryptoResult<AuthTag> {
        let mut mac =
            HmacSha256::new_from_slice(&self.bytes).map_err(|_| CryptoError::InvalidKeyLength {
                expected: MASTER_SECRET_LEN,
                actual: self.bytes.len(),
            })?;
        mac.update(message);
        let full = mac.finalize().into_bytes();
        AuthTag::try_from_slice(&full[..TAG_LEN])
    }

    /// Load an existing secret from a file, or generate and save a new one.
    ///
    /// If the file exists, reads 32 bytes. If it does not exist, generates a
    /// new secret and persists it with [`persist`](Self::persist). Creates
    /// parent directories if needed.
    ///
    /// # Security
    ///
    /// - The secret is generated before anything touches the filesystem and
    ///   is published with a single rename, so a failed or interrupted start
    ///   never leaves an empty or partial key file behind.
    /// - Two processes racing to create the file agree on one secret: the
    ///   loser of the rename reads the winner's file.
    /// - Refuses to read secret files that are symlinks.
    /// - Read buffers are wrapped in `Zeroizing`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::IoError`] on I/O failures or symlink detection,
    /// [`CryptoError::InvalidKeyLength`] if the file has the wrong length, or
    /// [`CryptoError::RandomnessUnavailable`] if a new secret cannot be generated.
    pub fn load_or_generate(path: impl AsRef<Path>) -> CryptoResult<Self> {
        Self::load_or_generate_with(path, &OsEntropy)
    }

    /// [`load_or_generate`](Self::load_or_generate) drawing a new secret from
    /// `source`.
    ///
    /// # Errors
    ///
    /// See [`load_or_generate`](Self::load_or_generate).
    pub fn load_or_generate_with(
        path: impl AsRef<Path>,
        source: &dyn EntropySource,
    ) -> CryptoResult<Self> {
        let path = path.as_ref();

        if let Some(existing) = Self::read_existing(path)? {
            return Ok(existing);
        }

        let secret = Self::generate_with(source)?;
        match secret.write_file(path, false) {
            Ok(()) => Ok(secret),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Self::read_existing(path)?.ok_or_else(|| {
                    CryptoError::IoError("master secret vanished while loading".into())
                })
            },
            Err(e) => Err(CryptoError::IoError(e.to_string())),
        }
    }

    /// Write the secret to `path` with 0o600 permissions on Unix.
    ///
    /// The bytes go to a temporary file in the same directory, are synced,
    /// and the file is then renamed into place. With `overwrite` unset an
    /// existing file is left untouched and an error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::IoError`] if the file cannot be written or, with
    /// `overwrite` unset, already exists.
    pub fn persist(&self, path: impl AsRef<Path>, overwrite: bool) -> CryptoResult<()> {
        self.write_file(path.as_ref(), overwrite)
            .map_err(|e| CryptoError::IoError(e.to_string()))
    }

    fn write_file(&self, path: &Path, overwrite: bool) -> std::io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        // NamedTempFile is created with mode 0o600 on Unix.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&self.bytes)?;
        tmp.as_file().sync_all()?;

        let persisted = if overwrite {
            tmp.persist(path)
        } else {
            tmp.persist_noclobber(path)
        };
        persisted.map(drop).map_err(|e| e.error)
    }

    /// Read the secret at `path`, or `None` if there is no file.
    fn read_existing(path: &Path) -> CryptoResult<Option<Self>> {
        let meta = match std::fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CryptoError::IoError(e.to_string())),
        };
        if meta.file_type().is_symlink() {
            return Err(CryptoError::IoError(
                "refusing to read master secret: path is a symlink".into(),
            ));
        }

        let bytes =
            Zeroizing::new(std::fs::read(path).map_err(|e| CryptoError::IoError(e.to_string()))?);
        Self::from_bytes(&bytes).map(Some)
    }
}

impl std::fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterSecret")
            .field("key_id", &self.key_id_hex())
            .finish_non_exhaustive()
    }
}
