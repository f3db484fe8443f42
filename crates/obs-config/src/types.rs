//! Configuration types for the OBS service.
//!
//! Every struct implements [`Default`] so that a bare `[section]` header in
//! TOML produces a working configuration.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration for the OBS service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage layout.
    pub service: ServiceSection,
    /// Master secret location.
    pub keys: KeysConfig,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// ServiceSection
// ---------------------------------------------------------------------------

/// Where buckets live on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSection {
    /// Directory under which every bucket is a subdirectory.
    pub save_root_path: String,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            save_root_path: "obs-data".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// KeysConfig
// ---------------------------------------------------------------------------

/// Source of the master secret that signs every credential.
///
/// `master_secret` (inline, base64) wins over `master_secret_path` when both
/// are set. The inline value never appears in `Debug` or serialized output.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeysConfig {
    /// Path to the 32-byte master secret file. Created on first use.
    pub master_secret_path: Option<String>,
    /// Master secret as standard base64. Prefer the environment over files.
    pub master_secret: Option<String>,
}

impl std::fmt::Debug for KeysConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeysConfig")
            .field("master_secret_path", &self.master_secret_path)
            .field("has_master_secret", &self.master_secret.is_some())
            .finish()
    }
}

impl Serialize for KeysConfig {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("KeysConfig", 1)?;
        state.serialize_field("master_secret_path", &self.master_secret_path)?;
        state.end()
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"` (human-friendly), `"compact"` (one-line),
    /// `"json"` (structured), or `"full"` (verbose).
    pub format: String,
    /// Per-crate tracing directives (e.g. `["obs_storage=debug"]`).
    pub directives: Vec<String>,
    /// Where log lines go: `"stderr"`, `"stdout"`, or `"file"`.
    pub target: String,
    /// Log directory. Required when `target = "file"`.
    pub directory: Option<String>,
    /// File rotation: `"daily"`, `"hourly"`, or `"never"`.
    pub rotation: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            target: "stderr".to_owned(),
            directory: None,
            rotation: "daily".to_owned(),
        }
    }
}
