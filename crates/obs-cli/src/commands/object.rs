//! Object commands.

use std::io::Write;
use std::path::Path;

use obs_storage::{BucketStore, FileTarget, PutOutcome, SimpleBucket};

use super::storage_failure;
use crate::theme::Theme;

/// Upload a local file under `key`.
pub(crate) async fn put(
    store: &BucketStore,
    request: &SimpleBucket,
    key: &str,
    file: &Path,
) -> anyhow::Result<()> {
    let body = tokio::fs::read(file).await?;
    let outcome = store
        .put_object(request, key, &body)
        .await
        .map_err(storage_failure)?;

    let verb = match outcome {
        PutOutcome::Created => "stored",
        PutOutcome::Overwritten => "replaced",
    };
    println!(
        "{}",
        Theme::success(&format!("{key} {verb} ({} bytes).", body.len()))
    );
    Ok(())
}

/// Download `key` to a file, or to stdout when no file is given.
pub(crate) async fn get(
    store: &BucketStore,
    request: &SimpleBucket,
    key: &str,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let body = store
        .get_object(request, key)
        .await
        .map_err(storage_failure)?;

    write_body(key, &body, output).await
}

/// Print a signed path for `key` as JSON.
pub(crate) async fn sign(store: &BucketStore, request: &SimpleBucket, key: &str) -> anyhow::Result<()> {
    let target = store
        .sign_object(request, key)
        .await
        .map_err(storage_failure)?;
    println!("{}", serde_json::to_string_pretty(&target)?);
    Ok(())
}

/// Download the object a signed path names.
pub(crate) async fn fetch(
    store: &BucketStore,
    bucket: &str,
    path: String,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let target = FileTarget { path };
    let body = store
        .get_signed_object(bucket, &target)
        .await
        .map_err(storage_failure)?;

    let key = target
        .path
        .rsplit_once(obs_credentials::SIGNATURE_PARAM)
        .map_or(target.path.as_str(), |(key, _)| key);
    write_body(key, &body, output).await
}

/// Remove `key`.
pub(crate) async fn remove(
    store: &BucketStore,
    request: &SimpleBucket,
    key: &str,
) -> anyhow::Result<()> {
    store
        .delete_object(request, key)
        .await
        .map_err(storage_failure)?;
    println!("{}", Theme::success(&format!("{key} deleted.")));
    Ok(())
}

async fn write_body(key: &str, body: &[u8], output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            tokio::fs::write(path, body).await?;
            eprintln!(
                "{}",
                Theme::success(&format!("{key} written to {}.", path.display()))
            );
        },
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(body)?;
            stdout.flush()?;
        },
    }
    Ok(())
}
