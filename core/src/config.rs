//! Runtime configuration loaded via OrthoConfig.
//!
//! Values come from `SLEEPY_*` environment variables or a configuration file;
//! the `sleepyctl` subcommands themselves are parsed separately with clap.

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_DATA_DIR: &str = "./sleepy-data";
const DEFAULT_DISMISS_REASON: &str = "Dismiss alarm";

/// Settings shared by every `sleepyctl` subcommand.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SLEEPY")]
pub struct SleepySettings {
    /// Directory holding `alarms.json`, `tags.json`, and `sleepLogs.json`.
    pub data_dir: Option<Utf8PathBuf>,
    /// PIN accepted by the credential fallback. Unset disables the fallback.
    pub fallback_pin: Option<String>,
    /// Reason shown when prompting for the fallback credential.
    pub dismiss_reason: Option<String>,
    /// Emit JSON log lines instead of human-readable ones.
    #[ortho_config(default = true)]
    pub log_json: bool,
}

impl SleepySettings {
    /// Return the configured data directory, falling back to the default.
    pub fn data_dir(&self) -> Utf8PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATA_DIR))
    }

    /// Return the configured prompt reason, falling back to the default.
    pub fn dismiss_reason(&self) -> &str {
        self.dismiss_reason
            .as_deref()
            .filter(|reason| !reason.trim().is_empty())
            .unwrap_or(DEFAULT_DISMISS_REASON)
    }
}
