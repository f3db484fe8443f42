//! Bucket commands.

use obs_credentials::PrivilegeLevel;
use obs_storage::{BucketStore, CreateBucket, SimpleBucket};
use zeroize::Zeroize;

use super::storage_failure;
use crate::theme::Theme;

/// Create a bucket and print the issued credential as JSON.
pub(crate) async fn create(
    store: &BucketStore,
    name: &str,
    actions: Vec<PrivilegeLevel>,
) -> anyhow::Result<()> {
    let request = CreateBucket {
        bucket_name: name.to_owned(),
        action: actions,
    };
    let mut creds = store
        .create_bucket(&request)
        .await
        .map_err(storage_failure)?;

    eprintln!("{}", Theme::success(&format!("Bucket '{name}' is ready.")));
    eprintln!(
        "{}",
        Theme::dimmed("Store the secret key now; it cannot be recovered.")
    );
    let mut rendered = serde_json::to_string_pretty(&creds)?;
    creds.zeroize();
    println!("{rendered}");
    rendered.zeroize();
    Ok(())
}

/// Print whether a bucket exists and its modification time.
pub(crate) async fn head(store: &BucketStore, name: &str) -> anyhow::Result<()> {
    let info = store.head_bucket(name).await.map_err(storage_failure)?;

    println!("\n{}", Theme::header("Bucket"));
    println!("{}", Theme::field("Name", &info.name));
    println!("{}", Theme::field("Last-Modified", &info.last_modified.to_rfc2822()));
    println!();
    Ok(())
}

/// Delete a bucket and everything in it.
pub(crate) async fn delete(store: &BucketStore, request: &SimpleBucket) -> anyhow::Result<()> {
    store.delete_bucket(request).await.map_err(storage_failure)?;
    println!(
        "{}",
        Theme::success(&format!("Bucket '{}' deleted.", request.bucket_name))
    );
    Ok(())
}
