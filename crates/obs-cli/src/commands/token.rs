//! Token command: check a credential without touching any bucket.

use obs_credentials::{PrivilegeLevel, TokenVerifier};

use crate::theme::Theme;

/// Verify a credential for `bucket` and print what it grants.
pub(crate) fn verify(
    verifier: &TokenVerifier,
    bucket: &str,
    ak: &str,
    sk: &str,
    require: Option<PrivilegeLevel>,
) -> anyhow::Result<()> {
    let result = match require {
        Some(level) => verifier.authorize(bucket, ak, sk, level),
        None => verifier.verify(bucket, ak, sk),
    };

    match result {
        Ok(granted) => {
            println!("{}", Theme::success("Credential is valid."));
            println!("{}", Theme::field("Bucket", bucket));
            println!("{}", Theme::field("Access key", ak));
            println!("{}", Theme::field("Grants", &granted.to_string()));
            if let Some(max) = granted.max() {
                println!("{}", Theme::field("Highest", max.as_str()));
            }
            Ok(())
        },
        Err(err) => {
            tracing::debug!(error = %err, "credential rejected");
            anyhow::bail!(Theme::error(&err.public_message()))
        },
    }
}
