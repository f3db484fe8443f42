//! Integration tests for bucket and object operations behind credentials.

use std::sync::Arc;

use obs_credentials::{PrivilegeLevel, TokenVerifier};
use obs_crypto::MasterSecret;
use obs_storage::{BucketStore, CreateBucket, PutOutcome, SimpleBucket, StorageError};

fn open_store(root: &std::path::Path, secret: &Arc<MasterSecret>) -> BucketStore {
    BucketStore::new(root, Arc::clone(secret))
}

async fn create(store: &BucketStore, name: &str, action: Vec<PrivilegeLevel>) -> SimpleBucket {
    let creds = store
        .create_bucket(&CreateBucket {
            bucket_name: name.to_owned(),
            action,
        })
        .await
        .unwrap();
    SimpleBucket {
        bucket_name: name.to_owned(),
        ak: creds.ak,
        sk: creds.sk,
    }
}

#[tokio::test]
async fn test_full_bucket_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let secret = Arc::new(MasterSecret::generate().unwrap());
    let store = open_store(dir.path(), &secret);

    let admin = create(&store, "media-2026", vec![PrivilegeLevel::Admin]).await;

    assert_eq!(
        store
            .put_object(&admin, "videos/intro.mp4", b"v1")
            .await
            .unwrap(),
        PutOutcome::Created
    );
    assert_eq!(
        store
            .put_object(&admin, "videos/intro.mp4", b"v2")
            .await
            .unwrap(),
        PutOutcome::Overwritten
    );
    assert_eq!(
        store
            .get_object(&admin, "videos/intro.mp4")
            .await
            .unwrap(),
        b"v2"
    );

    store
        .delete_object(&admin, "videos/intro.mp4")
        .await
        .unwrap();
    assert!(matches!(
        store.get_object(&admin, "videos/intro.mp4").await,
        Err(StorageError::ObjectNotFound { .. })
    ));

    let info = store.head_bucket("media-2026").await.unwrap();
    assert_eq!(info.name, "media-2026");

    store.delete_bucket(&admin).await.unwrap();
    assert!(matches!(
        store.head_bucket("media-2026").await,
        Err(StorageError::BucketNotFound(_))
    ));
}

#[tokio::test]
async fn test_privilege_ladder_gates_operations() {
    let dir = tempfile::tempdir().unwrap();
    let secret = Arc::new(MasterSecret::generate().unwrap());
    let store = open_store(dir.path(), &secret);

    let writer = create(&store, "shared", vec![PrivilegeLevel::Write]).await;
    // Creating an existing bucket again hands out another credential.
    let reader = create(&store, "shared", vec![PrivilegeLevel::Read]).await;

    store.put_object(&writer, "a.txt", b"one").await.unwrap();
    assert_eq!(store.get_object(&reader, "a.txt").await.unwrap(), b"one");

    // Read cannot write; Write cannot overwrite or delete.
    let err = store.put_object(&reader, "b.txt", b"x").await.unwrap_err();
    assert_eq!(err.status_code(), 403);
    let err = store.put_object(&writer, "a.txt", b"two").await.unwrap_err();
    assert_eq!(err.status_code(), 403);
    let err = store.delete_object(&writer, "a.txt").await.unwrap_err();
    assert_eq!(err.status_code(), 403);
    let err = store.delete_bucket(&writer).await.unwrap_err();
    assert_eq!(err.status_code(), 403);

    assert_eq!(store.get_object(&reader, "a.txt").await.unwrap(), b"one");
}

#[tokio::test]
async fn test_credentials_are_bound_to_their_bucket() {
    let dir = tempfile::tempdir().unwrap();
    let secret = Arc::new(MasterSecret::generate().unwrap());
    let store = open_store(dir.path(), &secret);

    let alpha = create(&store, "alpha", vec![PrivilegeLevel::Admin]).await;
    let _beta = create(&store, "beta", vec![PrivilegeLevel::Read]).await;

    let borrowed = SimpleBucket {
        bucket_name: "beta".into(),
        ak: alpha.ak.clone(),
        sk: alpha.sk.clone(),
    };
    let err = store.delete_bucket(&borrowed).await.unwrap_err();
    assert_eq!(err.status_code(), 403);
    assert_eq!(err.public_message(), "access denied");
    assert!(store.head_bucket("beta").await.is_ok());
}

#[tokio::test]
async fn test_restart_with_persisted_secret_keeps_credentials_valid() {
    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("master.key");
    let data = dir.path().join("data");

    let creds = {
        let secret = Arc::new(MasterSecret::load_or_generate(&key_path).unwrap());
        let store = open_store(&data, &secret);
        let creds = create(&store, "durable", vec![PrivilegeLevel::Update]).await;
        store.put_object(&creds, "state.json", b"{}").await.unwrap();
        creds
    };

    let secret = Arc::new(MasterSecret::load_or_generate(&key_path).unwrap());
    let store = open_store(&data, &secret);
    assert_eq!(
        store
            .put_object(&creds, "state.json", b"{\"v\":2}")
            .await
            .unwrap(),
        PutOutcome::Overwritten
    );

    // The same credential also checks out through a standalone verifier.
    let granted = TokenVerifier::new(secret)
        .verify("durable", &creds.ak, &creds.sk)
        .unwrap();
    assert!(granted.has_at_least(PrivilegeLevel::Write));
}

#[tokio::test]
async fn test_credentials_serialize_as_ak_sk_json() {
    let dir = tempfile::tempdir().unwrap();
    let secret = Arc::new(MasterSecret::generate().unwrap());
    let store = open_store(dir.path(), &secret);

    let creds = store
        .create_bucket(&CreateBucket {
            bucket_name: "exports".into(),
            action: vec![PrivilegeLevel::Read],
        })
        .await
        .unwrap();
    let json = serde_json::to_value(&creds).unwrap();
    let object = json.as_object().unwrap();

    assert_eq!(object.len(), 2);
    assert_eq!(object["ak"].as_str().unwrap().len(), 32);
    assert_eq!(object["sk"].as_str().unwrap().len(), 39);
}

#[tokio::test]
async fn test_traversal_keys_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let secret = Arc::new(MasterSecret::generate().unwrap());
    let store = open_store(&dir.path().join("data"), &secret);
    let admin = create(&store, "vault", vec![PrivilegeLevel::Admin]).await;

    for key in ["../escape", "a/../../escape", "/etc/passwd", ""] {
        let err = store.put_object(&admin, key, b"x").await.unwrap_err();
        assert!(
            matches!(err, StorageError::PathViolation(_)),
            "key {key:?} gave {err:?}"
        );
    }
    assert!(!dir.path().join("escape").exists());
}

#[tokio::test]
async fn test_signed_path_outlives_restart_but_not_a_new_secret() {
    let dir = tempfile::tempdir().unwrap();
    let secret = Arc::new(MasterSecret::generate().unwrap());
    let store = open_store(dir.path(), &secret);

    let writer = create(&store, "shared-docs", vec![PrivilegeLevel::Write]).await;
    store
        .put_object(&writer, "notes/today.md", b"# today")
        .await
        .unwrap();
    let reader = create(&store, "shared-docs", vec![PrivilegeLevel::Read]).await;
    let target = store
        .sign_object(&reader, "notes/today.md")
        .await
        .unwrap();
    assert!(target.path.starts_with("notes/today.md?sig="));

    let restarted = open_store(dir.path(), &secret);
    assert_eq!(
        restarted
            .get_signed_object("shared-docs", &target)
            .await
            .unwrap(),
        b"# today"
    );

    let rekeyed = open_store(dir.path(), &Arc::new(MasterSecret::generate().unwrap()));
    let err = rekeyed
        .get_signed_object("shared-docs", &target)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Credential(_)));
    assert_eq!(err.status_code(), 403);
}
