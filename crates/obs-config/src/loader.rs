//! Config file discovery and layered loading.
//!
//! Implements the `Config::load()` algorithm:
//! 1. Parse `defaults.toml` → base
//! 2. Merge `/etc/obs/config.toml` (system)
//! 3. Merge `~/.obs/config.toml` (user)
//! 4. Merge the explicit `--config` file, which must exist
//! 5. Apply env var fallbacks for fields no file set
//! 6. Deserialize merged tree → `Config`
//! 7. Validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// System-wide config location.
const SYSTEM_CONFIG_PATH: &str = "/etc/obs/config.toml";

/// A loaded configuration together with where each value came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final merged configuration.
    pub config: Config,
    /// Dotted field path → which layer set the value.
    pub field_sources: FieldSources,
    /// Config file paths that were loaded (in precedence order).
    pub loaded_files: Vec<String>,
}

/// Explicit locations for each file layer.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// System config file; skipped when missing.
    pub system: Option<PathBuf>,
    /// User config file; skipped when missing.
    pub user: Option<PathBuf>,
    /// Explicit config file; an error when missing.
    pub explicit: Option<PathBuf>,
}

impl ConfigPaths {
    /// Standard locations, with `home_override` standing in for the
    /// `~/.obs` directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDir`] if no override is given and the home
    /// directory cannot be determined.
    pub fn discover(explicit: Option<&Path>, home_override: Option<&Path>) -> ConfigResult<Self> {
        let user = match home_override {
            Some(dir) => dir.join("config.toml"),
            None => home_directory()?.join(".obs").join("config.toml"),
        };
        Ok(Self {
            system: Some(PathBuf::from(SYSTEM_CONFIG_PATH)),
            user: Some(user),
            explicit: explicit.map(Path::to_path_buf),
        })
    }
}

/// Load the configuration from the standard locations and the process
/// environment.
///
/// # Errors
///
/// Returns a [`ConfigError`] if any config file is malformed, the explicit
/// file cannot be read, or the final configuration fails validation.
pub fn load(explicit: Option<&Path>, home_override: Option<&Path>) -> ConfigResult<ResolvedConfig> {
    let paths = ConfigPaths::discover(explicit, home_override)?;
    load_from(&paths, &collect_env_vars())
}

/// Load the configuration from the given paths and environment snapshot.
///
/// # Errors
///
/// See [`load`].
pub fn load_from<S: std::hash::BuildHasher>(
    paths: &ConfigPaths,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_leaves(&merged, "", ConfigLayer::Defaults, &mut field_sources);

    let optional_layers = [
        (paths.system.as_deref(), ConfigLayer::System),
        (paths.user.as_deref(), ConfigLayer::User),
    ];
    for (path, layer) in optional_layers {
        let Some(path) = path else { continue };
        if let Some(overlay) = try_load_file(path)? {
            deep_merge_tracking(&mut merged, &overlay, "", layer, &mut field_sources);
            loaded_files.push(path.display().to_string());
            info!(path = %path.display(), %layer, "loaded config");
        }
    }

    if let Some(path) = paths.explicit.as_deref() {
        let overlay = read_file(path)?;
        deep_merge_tracking(
            &mut merged,
            &overlay,
            "",
            ConfigLayer::Explicit,
            &mut field_sources,
        );
        loaded_files.push(path.display().to_string());
        info!(path = %path.display(), "loaded explicit config");
    }

    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    let config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Load a config from a specific file path (no layering).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read, parsed, or fails
/// validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let value = read_file(path)?;
    let config: Config = value
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: path.display().to_string(),
            source: e,
        })?;
    validate::validate(&config)?;
    Ok(config)
}

/// Try to load a file, returning `None` if the file doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    match read_file(path) {
        Ok(value) => Ok(Some(value)),
        Err(ConfigError::ReadError { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            debug!(path = %path.display(), "config file not found, skipping");
            Ok(None)
        },
        Err(e) => Err(e),
    }
}

/// Read and parse a TOML file, enforcing the size limit.
///
/// Uses a single read so there is no window between a size check and the
/// read itself.
fn read_file(path: &Path) -> ConfigResult<toml::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {} byte limit",
                content.len(),
                MAX_CONFIG_FILE_SIZE
            ),
        });
    }

    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })
}

/// Determine the user's home directory.
fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    fn paths_in(dir: &Path) -> ConfigPaths {
        ConfigPaths {
            system: Some(dir.join("system.toml")),
            user: Some(dir.join("user.toml")),
            explicit: None,
        }
    }

    #[test]
    fn test_defaults_deserialize_to_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config.service.save_root_path, "obs-data");
        assert_eq!(config.logging.level, "info");
        assert!(config.keys.master_secret.is_none());
    }

    #[test]
    fn test_load_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = load_from(&paths_in(dir.path()), &no_env()).unwrap();
        assert!(resolved.loaded_files.is_empty());
        assert_eq!(
            resolved.field_sources.get("logging.level"),
            Some(&ConfigLayer::Defaults)
        );
    }

    #[test]
    fn test_layers_apply_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("system.toml"),
            "[service]\nsave_root_path = \"/srv/system\"\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("user.toml"),
            "[service]\nsave_root_path = \"/srv/user\"\n",
        )
        .unwrap();
        let explicit = dir.path().join("explicit.toml");
        std::fs::write(&explicit, "[logging]\nformat = \"json\"\n").unwrap();

        let mut paths = paths_in(dir.path());
        paths.explicit = Some(explicit);
        let resolved = load_from(&paths, &no_env()).unwrap();

        assert_eq!(resolved.config.service.save_root_path, "/srv/user");
        assert_eq!(resolved.config.logging.level, "warn");
        assert_eq!(resolved.config.logging.format, "json");
        assert_eq!(resolved.loaded_files.len(), 3);
        assert_eq!(
            resolved.field_sources.get("logging.format"),
            Some(&ConfigLayer::Explicit)
        );
    }

    #[test]
    fn test_env_is_fallback_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("user.toml"), "[logging]\nlevel = \"error\"\n").unwrap();

        let env: HashMap<String, String> = [
            ("OBS_LOG_LEVEL".to_owned(), "trace".to_owned()),
            ("OBS_MASTER_SECRET".to_owned(), "c2VjcmV0".to_owned()),
        ]
        .into_iter()
        .collect();
        let resolved = load_from(&paths_in(dir.path()), &env).unwrap();

        assert_eq!(resolved.config.logging.level, "error");
        assert_eq!(resolved.config.keys.master_secret.as_deref(), Some("c2VjcmV0"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = paths_in(dir.path());
        paths.explicit = Some(dir.path().join("absent.toml"));
        assert!(matches!(
            load_from(&paths, &no_env()),
            Err(ConfigError::ReadError { .. })
        ));
    }

    #[test]
    fn test_invalid_merged_value_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("user.toml"), "[logging]\nlevel = \"loud\"\n").unwrap();
        assert!(matches!(
            load_from(&paths_in(dir.path()), &no_env()),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("system.toml"), "[service\n").unwrap();
        assert!(matches!(
            load_from(&paths_in(dir.path()), &no_env()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_load_file_nonexistent() {
        let result = load_file(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_try_load_file_missing() {
        let result = try_load_file(Path::new("/nonexistent/config.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_oversized_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("huge.toml");
        let data = "x = \"".to_owned() + &"a".repeat(1_100_000) + "\"";
        std::fs::write(&file_path, data).unwrap();

        let result = try_load_file(&file_path);
        assert!(
            matches!(result, Err(ConfigError::ValidationError { .. })),
            "Expected ValidationError for oversized config, got: {result:?}"
        );
    }

    #[test]
    fn test_keys_debug_and_serialize_redact_secret() {
        let mut config = Config::default();
        config.keys.master_secret = Some("c3VwZXItc2VjcmV0".to_owned());

        let debug_str = format!("{:?}", config.keys);
        assert!(!debug_str.contains("c3VwZXItc2VjcmV0"));
        assert!(debug_str.contains("has_master_secret: true"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("c3VwZXItc2VjcmV0"));
        assert!(!json.contains("\"master_secret\""));
    }
}
