//! Turns loaded configuration into runtime values.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use obs_config::Config;
use obs_crypto::MasterSecret;
use obs_storage::BucketStore;
use obs_telemetry::LogConfig;

/// File name of the master secret under `~/.obs`.
const MASTER_SECRET_FILE: &str = "master.key";

/// Where the master secret comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SecretSource {
    /// Inline base64 value from config or `OBS_MASTER_SECRET`.
    Inline,
    /// A key file, created on first use.
    File(PathBuf),
}

/// Convert config to [`LogConfig`].
pub(crate) fn to_log_config(cfg: &Config) -> LogConfig {
    LogConfig::from(&cfg.logging)
}

/// Decide which master secret source the config selects.
pub(crate) fn secret_source(cfg: &Config) -> Result<SecretSource> {
    if cfg.keys.master_secret.is_some() {
        return Ok(SecretSource::Inline);
    }
    match &cfg.keys.master_secret_path {
        Some(path) => Ok(SecretSource::File(PathBuf::from(path))),
        None => Ok(SecretSource::File(default_secret_path()?)),
    }
}

/// Load the master secret selected by the config, generating the key file
/// if it does not exist yet.
pub(crate) fn load_master_secret(cfg: &Config) -> Result<MasterSecret> {
    match secret_source(cfg)? {
        SecretSource::Inline => {
            let encoded = cfg.keys.master_secret.as_deref().unwrap_or_default();
            MasterSecret::from_base64(encoded).context("keys.master_secret is not a valid secret")
        },
        SecretSource::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            MasterSecret::load_or_generate(&path)
                .with_context(|| format!("loading master secret from {}", path.display()))
        },
    }
}

/// Build the bucket store described by the config.
pub(crate) fn open_store(cfg: &Config) -> Result<BucketStore> {
    let secret = Arc::new(load_master_secret(cfg)?);
    Ok(BucketStore::new(&cfg.service.save_root_path, secret))
}

fn default_secret_path() -> Result<PathBuf> {
    let dirs = directories::BaseDirs::new().context("could not determine home directory")?;
    Ok(dirs.home_dir().join(".obs").join(MASTER_SECRET_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_secret_wins() {
        let secret = MasterSecret::generate().unwrap();
        let mut cfg = Config::default();
        cfg.keys.master_secret = Some(secret.to_base64());
        cfg.keys.master_secret_path = Some("/nonexistent/master.key".to_owned());

        assert_eq!(secret_source(&cfg).unwrap(), SecretSource::Inline);
        let loaded = load_master_secret(&cfg).unwrap();
        assert_eq!(loaded.key_id(), secret.key_id());
    }

    #[test]
    fn test_secret_file_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("master.key");
        let mut cfg = Config::default();
        cfg.keys.master_secret_path = Some(path.display().to_string());

        let first = load_master_secret(&cfg).unwrap();
        let second = load_master_secret(&cfg).unwrap();
        assert!(path.exists());
        assert_eq!(first.key_id(), second.key_id());
    }

    #[test]
    fn test_bad_inline_secret() {
        let mut cfg = Config::default();
        cfg.keys.master_secret = Some("not base64!".to_owned());
        assert!(load_master_secret(&cfg).is_err());
    }

    #[test]
    fn test_log_config_from_section() {
        let mut cfg = Config::default();
        "json".clone_into(&mut cfg.logging.format);
        let lc = to_log_config(&cfg);
        assert_eq!(lc.format, obs_telemetry::LogFormat::Json);
    }
}
