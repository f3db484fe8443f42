//! Buckets as directories under a root, objects as files inside them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use obs_credentials::{Credentials, PathSigner, PrivilegeSet, TokenIssuer, TokenVerifier};
use obs_crypto::MasterSecret;
use obs_telemetry::RequestContext;
use tokio::io::AsyncWriteExt;
use tracing::{Instrument, info};

use crate::error::{StorageError, StorageResult};
use crate::model::{BucketInfo, CreateBucket, FileTarget, PutOutcome, SimpleBucket};
use crate::name::BucketName;
use crate::operation::Operation;
use crate::path::{reject_symlinks, resolve_object_path};

/// Filesystem-backed bucket store.
///
/// Holds no per-bucket state: every authenticated call re-verifies the
/// presented credential against the master secret.
#[derive(Debug, Clone)]
pub struct BucketStore {
    root: PathBuf,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    signer: PathSigner,
}

impl BucketStore {
    /// Create a store rooted at `root`, signing credentials with `secret`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, secret: Arc<MasterSecret>) -> Self {
        Self {
            root: root.into(),
            issuer: TokenIssuer::new(Arc::clone(&secret)),
            verifier: TokenVerifier::new(Arc::clone(&secret)),
            signer: PathSigner::new(secret),
        }
    }

    /// Directory holding all buckets.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, name: &BucketName) -> PathBuf {
        self.root.join(name.as_str())
    }

    fn context(operation: Operation, bucket: &str, access_key: Option<&str>) -> RequestContext {
        let ctx = RequestContext::new("obs-storage")
            .with_operation(operation.as_str())
            .with_bucket(bucket);
        match access_key {
            Some(ak) => ctx.with_access_key(ak),
            None => ctx,
        }
    }

    /// Create a bucket and issue a credential for the requested actions.
    ///
    /// Creating a bucket that already exists leaves its contents alone and
    /// issues a fresh credential.
    ///
    /// # Errors
    ///
    /// [`StorageError::InvalidBucketName`], a credential error if the action
    /// list is empty or randomness is unavailable, or [`StorageError::Io`].
    pub async fn create_bucket(&self, request: &CreateBucket) -> StorageResult<Credentials> {
        let ctx = Self::context(Operation::CreateBucket, &request.bucket_name, None);
        async {
            let name = BucketName::parse(&request.bucket_name)?;
            let token = self
                .issuer
                .issue_actions(name.as_str(), request.action.iter().copied())?;

            let dir = self.bucket_dir(&name);
            tokio::fs::create_dir_all(&dir).await?;

            info!(access_key = %token.access_key, "bucket created");
            Ok(token.credentials())
        }
        .instrument(ctx.span())
        .await
    }

    /// Report whether a bucket exists and when it was last modified.
    ///
    /// # Errors
    ///
    /// [`StorageError::InvalidBucketName`], [`StorageError::BucketNotFound`]
    /// when the path is missing or not a directory, or [`StorageError::Io`].
    pub async fn head_bucket(&self, bucket_name: &str) -> StorageResult<BucketInfo> {
        let ctx = Self::context(Operation::HeadBucket, bucket_name, None);
        async {
            let name = BucketName::parse(bucket_name)?;
            let meta = self.bucket_metadata(&name).await?;
            let last_modified = DateTime::<Utc>::from(meta.modified()?);

            Ok(BucketInfo {
                name: name.to_string(),
                last_modified,
            })
        }
        .instrument(ctx.span())
        .await
    }

    /// Delete a bucket and all its objects. Requires `Delete`.
    ///
    /// # Errors
    ///
    /// [`StorageError::InvalidBucketName`], a credential error if the key
    /// does not verify or lacks `Delete`, [`StorageError::BucketNotFound`],
    /// or [`StorageError::Io`].
    pub async fn delete_bucket(&self, request: &SimpleBucket) -> StorageResult<()> {
        let ctx = Self::context(Operation::DeleteBucket, &request.bucket_name, Some(&request.ak));
        async {
            let name = self.authorize(request, Operation::DeleteBucket)?;
            self.bucket_metadata(&name).await?;

            tokio::fs::remove_dir_all(self.bucket_dir(&name)).await?;
            info!("bucket deleted");
            Ok(())
        }
        .instrument(ctx.span())
        .await
    }

    /// Store `body` under `key`.
    ///
    /// Requires `Write` for a new key and `Update` to replace an existing
    /// object. Missing parent directories inside the bucket are created.
    ///
    /// # Errors
    ///
    /// Credential errors, [`StorageError::BucketNotFound`],
    /// [`StorageError::PathViolation`], or [`StorageError::Io`].
    pub async fn put_object(
        &self,
        request: &SimpleBucket,
        key: &str,
        body: &[u8],
    ) -> StorageResult<PutOutcome> {
        let ctx = Self::context(Operation::PutObject, &request.bucket_name, Some(&request.ak));
        async {
            let (name, granted) = self.verify(request)?;
            let target = self.object_path(&name, key).await?;

            if tokio::fs::metadata(&target).await.is_ok_and(|meta| meta.is_dir()) {
                return Err(directory_key());
            }
            require(granted, Operation::PutObject)?;

            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            // Creation is exclusive, so a writer without `Update` can never
            // replace an object another writer created first.
            let (mut file, outcome) = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)
                .await
            {
                Ok(file) => (file, PutOutcome::Created),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    require(granted, Operation::OverwriteObject)?;
                    let file = tokio::fs::OpenOptions::new()
                        .write(true)
                        .truncate(true)
                        .open(&target)
                        .await
                        .map_err(|e| match e.kind() {
                            std::io::ErrorKind::IsADirectory => directory_key(),
                            _ => e.into(),
                        })?;
                    (file, PutOutcome::Overwritten)
                },
                Err(e) => return Err(e.into()),
            };
            file.write_all(body).await?;
            file.flush().await?;

            info!(key, size = body.len(), ?outcome, "object stored");
            Ok(outcome)
        }
        .instrument(ctx.span())
        .await
    }

    /// Read the object stored under `key`. Requires `Read`.
    ///
    /// # Errors
    ///
    /// Credential errors, [`StorageError::BucketNotFound`],
    /// [`StorageError::ObjectNotFound`], [`StorageError::PathViolation`], or
    /// [`StorageError::Io`].
    pub async fn get_object(&self, request: &SimpleBucket, key: &str) -> StorageResult<Vec<u8>> {
        let ctx = Self::context(Operation::GetObject, &request.bucket_name, Some(&request.ak));
        async {
            let name = self.authorize(request, Operation::GetObject)?;
            let target = self.object_path(&name, key).await?;

            match tokio::fs::read(&target).await {
                Ok(body) => Ok(body),
                Err(e) if is_missing(&e) => Err(object_not_found(&name, key)),
                Err(e) => Err(e.into()),
            }
        }
        .instrument(ctx.span())
        .await
    }

    /// Remove the object stored under `key`. Requires `Delete`.
    ///
    /// # Errors
    ///
    /// Credential errors, [`StorageError::BucketNotFound`],
    /// [`StorageError::ObjectNotFound`], [`StorageError::PathViolation`], or
    /// [`StorageError::Io`].
    pub async fn delete_object(&self, request: &SimpleBucket, key: &str) -> StorageResult<()> {
        let ctx = Self::context(Operation::DeleteObject, &request.bucket_name, Some(&request.ak));
        async {
            let name = self.authorize(request, Operation::DeleteObject)?;
            let target = self.object_path(&name, key).await?;

            match tokio::fs::remove_file(&target).await {
                Ok(()) => {
                    info!(key, "object deleted");
                    Ok(())
                },
                Err(e) if is_missing(&e) => Err(object_not_found(&name, key)),
                Err(e) => Err(e.into()),
            }
        }
        .instrument(ctx.span())
        .await
    }

    /// Sign `key` so it can be downloaded without the bucket's secret key.
    /// Requires `Read`, and the object must exist.
    ///
    /// # Errors
    ///
    /// Credential errors, [`StorageError::BucketNotFound`],
    /// [`StorageError::ObjectNotFound`], [`StorageError::PathViolation`], or
    /// [`StorageError::Io`].
    pub async fn sign_object(&self, request: &SimpleBucket, key: &str) -> StorageResult<FileTarget> {
        let ctx = Self::context(Operation::SignObject, &request.bucket_name, Some(&request.ak));
        async {
            let name = self.authorize(request, Operation::SignObject)?;
            let target = self.object_path(&name, key).await?;

            match tokio::fs::metadata(&target).await {
                Ok(meta) if meta.is_file() => {},
                Ok(_) => return Err(object_not_found(&name, key)),
                Err(e) if is_missing(&e) => return Err(object_not_found(&name, key)),
                Err(e) => return Err(e.into()),
            }

            let path = self.signer.sign(name.as_str(), key)?;
            info!(key, "object signed");
            Ok(FileTarget { path })
        }
        .instrument(ctx.span())
        .await
    }

    /// Read the object a signed path names.
    ///
    /// # Errors
    ///
    /// [`StorageError::InvalidBucketName`], a credential error if the
    /// signature does not cover this bucket and key,
    /// [`StorageError::BucketNotFound`], [`StorageError::ObjectNotFound`],
    /// [`StorageError::PathViolation`], or [`StorageError::Io`].
    pub async fn get_signed_object(
        &self,
        bucket_name: &str,
        target: &FileTarget,
    ) -> StorageResult<Vec<u8>> {
        let ctx = Self::context(Operation::GetSignedObject, bucket_name, None);
        async {
            let name = BucketName::parse(bucket_name)?;
            let key = self.signer.verify(name.as_str(), &target.path)?;
            let path = self.object_path(&name, key).await?;

            match tokio::fs::read(&path).await {
                Ok(body) => Ok(body),
                Err(e) if is_missing(&e) => Err(object_not_found(&name, key)),
                Err(e) => Err(e.into()),
            }
        }
        .instrument(ctx.span())
        .await
    }

    /// Validate the bucket name and verify the credential.
    fn verify(&self, request: &SimpleBucket) -> StorageResult<(BucketName, PrivilegeSet)> {
        let name = BucketName::parse(&request.bucket_name)?;
        let granted = self
            .verifier
            .verify(name.as_str(), &request.ak, &request.sk)?;
        Ok((name, granted))
    }

    /// Verify the credential and require the level `operation` needs.
    fn authorize(&self, request: &SimpleBucket, operation: Operation) -> StorageResult<BucketName> {
        let (name, granted) = self.verify(request)?;
        require(granted, operation)?;
        Ok(name)
    }

    async fn bucket_metadata(&self, name: &BucketName) -> StorageResult<std::fs::Metadata> {
        match tokio::fs::metadata(self.bucket_dir(name)).await {
            Ok(meta) if meta.is_dir() => Ok(meta),
            Ok(_) => Err(StorageError::BucketNotFound(name.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::BucketNotFound(name.to_string()))
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve `key` inside an existing bucket.
    async fn object_path(&self, name: &BucketName, key: &str) -> StorageResult<PathBuf> {
        self.bucket_metadata(name).await?;
        let bucket_dir = self.bucket_dir(name);
        let target = resolve_object_path(&bucket_dir, key)?;
        reject_symlinks(&bucket_dir, &target).await?;
        Ok(target)
    }
}

fn require(granted: PrivilegeSet, operation: Operation) -> StorageResult<()> {
    if let Some(level) = operation.required_level() {
        obs_credentials::require(granted, level)?;
    }
    Ok(())
}

fn is_missing(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::NotFound | std::io::ErrorKind::IsADirectory
    )
}

fn directory_key() -> StorageError {
    StorageError::PathViolation("object key names a directory".into())
}

fn object_not_found(name: &BucketName, key: &str) -> StorageError {
    StorageError::ObjectNotFound {
        bucket: name.to_string(),
        key: key.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use obs_credentials::{CredentialError, PrivilegeLevel};

    use super::*;

    fn store() -> (tempfile::TempDir, BucketStore) {
        let dir = tempfile::tempdir().unwrap();
        let secret = Arc::new(MasterSecret::generate().unwrap());
        let store = BucketStore::new(dir.path().join("buckets"), secret);
        (dir, store)
    }

    async fn create(store: &BucketStore, bucket: &str, action: &[PrivilegeLevel]) -> SimpleBucket {
        let creds = store
            .create_bucket(&CreateBucket {
                bucket_name: bucket.to_owned(),
                action: action.to_vec(),
            })
            .await
            .unwrap();
        SimpleBucket {
            bucket_name: bucket.to_owned(),
            ak: creds.ak,
            sk: creds.sk,
        }
    }

    #[tokio::test]
    async fn test_create_and_head_bucket() {
        let (_dir, store) = store();
        create(&store, "photos", &[PrivilegeLevel::Read]).await;

        let info = store.head_bucket("photos").await.unwrap();
        assert_eq!(info.name, "photos");
        assert!(store.root().join("photos").is_dir());
    }

    #[tokio::test]
    async fn test_head_missing_bucket() {
        let (_dir, store) = store();
        assert!(matches!(
            store.head_bucket("missing").await,
            Err(StorageError::BucketNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_head_file_is_not_a_bucket() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.root()).unwrap();
        std::fs::write(store.root().join("notdir"), b"x").unwrap();
        assert!(matches!(
            store.head_bucket("notdir").await,
            Err(StorageError::BucketNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_name_and_empty_actions() {
        let (_dir, store) = store();
        let err = store
            .create_bucket(&CreateBucket {
                bucket_name: "../escape".to_owned(),
                action: vec![PrivilegeLevel::Read],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidBucketName { .. }));

        let err = store
            .create_bucket(&CreateBucket {
                bucket_name: "photos".to_owned(),
                action: Vec::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Credential(CredentialError::InvalidRequest(_))
        ));
        assert_eq!(err.status_code(), 400);
        assert!(!store.root().join("photos").exists());
    }

    #[tokio::test]
    async fn test_delete_bucket_requires_delete() {
        let (_dir, store) = store();
        let reader = create(&store, "photos", &[PrivilegeLevel::Read]).await;

        let err = store.delete_bucket(&reader).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Credential(CredentialError::InsufficientPrivilege { .. })
        ));
        assert_eq!(err.status_code(), 403);
        assert!(store.root().join("photos").is_dir());

        let admin = create(&store, "photos", &[PrivilegeLevel::Delete]).await;
        store.delete_bucket(&admin).await.unwrap();
        assert!(!store.root().join("photos").exists());

        assert!(matches!(
            store.delete_bucket(&admin).await,
            Err(StorageError::BucketNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_credential_bound_to_bucket() {
        let (_dir, store) = store();
        let mut creds = create(&store, "photos", &[PrivilegeLevel::Delete]).await;
        create(&store, "videos", &[PrivilegeLevel::Read]).await;

        creds.bucket_name = "videos".to_owned();
        let err = store.delete_bucket(&creds).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Credential(CredentialError::TagMismatch)
        ));
        assert_eq!(err.public_message(), "access denied");
        assert!(store.root().join("videos").is_dir());
    }

    #[tokio::test]
    async fn test_object_lifecycle_levels() {
        let (_dir, store) = store();
        let writer = create(&store, "docs", &[PrivilegeLevel::Write]).await;
        let updater = create(&store, "docs", &[PrivilegeLevel::Update]).await;
        let deleter = create(&store, "docs", &[PrivilegeLevel::Delete]).await;

        assert_eq!(
            store.put_object(&writer, "a/b.txt", b"one").await.unwrap(),
            PutOutcome::Created
        );
        assert_eq!(store.get_object(&writer, "a/b.txt").await.unwrap(), b"one");

        let err = store.put_object(&writer, "a/b.txt", b"two").await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Credential(CredentialError::InsufficientPrivilege {
                required: PrivilegeLevel::Update,
                ..
            })
        ));

        assert_eq!(
            store.put_object(&updater, "a/b.txt", b"two").await.unwrap(),
            PutOutcome::Overwritten
        );
        assert_eq!(store.get_object(&updater, "a/b.txt").await.unwrap(), b"two");

        assert!(store.delete_object(&updater, "a/b.txt").await.is_err());
        store.delete_object(&deleter, "a/b.txt").await.unwrap();
        assert!(matches!(
            store.get_object(&deleter, "a/b.txt").await,
            Err(StorageError::ObjectNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_object_key_cannot_escape_bucket() {
        let (_dir, store) = store();
        let writer = create(&store, "docs", &[PrivilegeLevel::Write]).await;
        create(&store, "other", &[PrivilegeLevel::Read]).await;

        for key in ["../other/x.txt", "/etc/passwd", ""] {
            assert!(
                matches!(
                    store.put_object(&writer, key, b"x").await,
                    Err(StorageError::PathViolation(_))
                ),
                "{key:?}"
            );
        }
        assert!(!store.root().join("other").join("x.txt").exists());
    }

    #[tokio::test]
    async fn test_put_over_directory_rejected() {
        let (_dir, store) = store();
        let writer = create(&store, "docs", &[PrivilegeLevel::Update]).await;
        store.put_object(&writer, "dir/file", b"x").await.unwrap();

        assert!(matches!(
            store.put_object(&writer, "dir", b"x").await,
            Err(StorageError::PathViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_forged_secret_rejected_before_io() {
        let (_dir, store) = store();
        let mut creds = create(&store, "docs", &[PrivilegeLevel::Write]).await;
        creds.sk.replace_range(..1, if creds.sk.starts_with('A') { "B" } else { "A" });

        let err = store.put_object(&creds, "x.txt", b"x").await.unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(!store.root().join("docs").join("x.txt").exists());
    }

    #[tokio::test]
    async fn test_unknown_bucket_with_valid_signature_is_not_found() {
        let (_dir, store) = store();
        let creds = create(&store, "docs", &[PrivilegeLevel::Delete]).await;
        tokio::fs::remove_dir_all(store.root().join("docs")).await.unwrap();

        assert!(matches!(
            store.get_object(&creds, "x").await,
            Err(StorageError::BucketNotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_cannot_overwrite_without_update() {
        let (_dir, store) = store();
        let store = Arc::new(store);
        let writer = create(&store, "race", &[PrivilegeLevel::Write]).await;

        for round in 0..20 {
            let key = format!("obj-{round}");
            let handles: Vec<_> = (0..16u8)
                .map(|i| {
                    let store = Arc::clone(&store);
                    let writer = writer.clone();
                    let key = key.clone();
                    tokio::spawn(async move { store.put_object(&writer, &key, &[i]).await })
                })
                .collect();

            let mut outcomes = Vec::new();
            for handle in handles {
                match handle.await.unwrap() {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(err) => assert!(
                        matches!(
                            err,
                            StorageError::Credential(CredentialError::InsufficientPrivilege {
                                required: PrivilegeLevel::Update,
                                ..
                            })
                        ),
                        "unexpected error: {err:?}"
                    ),
                }
            }
            assert_eq!(outcomes, vec![PutOutcome::Created], "{key}");
        }
    }

    #[tokio::test]
    async fn test_signed_path_downloads_only_its_object() {
        let (_dir, store) = store();
        let admin = create(&store, "bucket-a", &[PrivilegeLevel::Admin]).await;
        let other = create(&store, "bucket-b", &[PrivilegeLevel::Admin]).await;
        let reader = create(&store, "bucket-a", &[PrivilegeLevel::Read]).await;
        store.put_object(&admin, "docs/a.txt", b"alpha").await.unwrap();
        store.put_object(&other, "docs/a.txt", b"beta").await.unwrap();

        let target = store.sign_object(&reader, "docs/a.txt").await.unwrap();
        assert!(target.path.starts_with("docs/a.txt?sig="));
        assert_eq!(
            store.get_signed_object("bucket-a", &target).await.unwrap(),
            b"alpha"
        );

        // The same path presented against another bucket does not validate.
        let err = store
            .get_signed_object("bucket-b", &target)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Credential(CredentialError::TagMismatch)
        ));
        assert_eq!(err.status_code(), 403);

        let retargeted = FileTarget {
            path: target.path.replacen("docs/a.txt", "docs/b.txt", 1),
        };
        assert!(matches!(
            store.get_signed_object("bucket-a", &retargeted).await,
            Err(StorageError::Credential(CredentialError::TagMismatch))
        ));
    }

    #[tokio::test]
    async fn test_sign_requires_existing_object() {
        let (_dir, store) = store();
        let reader = create(&store, "docs", &[PrivilegeLevel::Read]).await;

        assert!(matches!(
            store.sign_object(&reader, "missing.txt").await,
            Err(StorageError::ObjectNotFound { .. })
        ));

        let mut forged = reader.clone();
        forged.sk.push('A');
        assert_eq!(
            store
                .sign_object(&forged, "missing.txt")
                .await
                .unwrap_err()
                .status_code(),
            403
        );
    }

    #[tokio::test]
    async fn test_signed_path_fails_once_object_deleted() {
        let (_dir, store) = store();
        let admin = create(&store, "docs", &[PrivilegeLevel::Admin]).await;
        store.put_object(&admin, "a.txt", b"x").await.unwrap();
        let target = store.sign_object(&admin, "a.txt").await.unwrap();

        store.delete_object(&admin, "a.txt").await.unwrap();
        assert!(matches!(
            store.get_signed_object("docs", &target).await,
            Err(StorageError::ObjectNotFound { .. })
        ));
    }
}
