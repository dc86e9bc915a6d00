//! Layered application configuration.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

/// Directory under the platform config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "reelmark";
/// File name of the user configuration.
pub const CONFIG_FILE: &str = "config.toml";

const DEFAULT_CONFIG: &str = r#"# reelmark configuration
#
# Every key can be overridden from the environment, e.g.
# REELMARK__TMDB__API_KEY=... or REELMARK__FIREBASE__PROJECT_ID=...

[tmdb]
api_key = ""
base_url = "https://api.themoviedb.org/3"
image_base_url = "https://image.tmdb.org/t/p/"
timeout_secs = 30

[firebase]
api_key = ""
project_id = ""
auth_url = "https://identitytoolkit.googleapis.com/v1"
firestore_url = "https://firestore.googleapis.com/v1"
favorites_collection = "favorites"
"#;

/// Movie catalog settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmdbConfig {
    /// API key appended to every request.
    pub api_key: String,
    /// REST base URL without trailing slash.
    pub base_url: String,
    /// Image CDN base URL with trailing slash.
    pub image_base_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl TmdbConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.themoviedb.org/3".to_string(),
            image_base_url: "https://image.tmdb.org/t/p/".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Identity and document store settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FirebaseConfig {
    /// Web API key of the project.
    pub api_key: String,
    /// Project identifier used in document paths.
    pub project_id: String,
    /// Identity Toolkit base URL.
    pub auth_url: String,
    /// Firestore REST base URL.
    pub firestore_url: String,
    /// Collection holding one favorites document per user.
    pub favorites_collection: String,
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            project_id: String::new(),
            auth_url: "https://identitytoolkit.googleapis.com/v1".to_string(),
            firestore_url: "https://firestore.googleapis.com/v1".to_string(),
            favorites_collection: "favorites".to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Catalog section.
    #[serde(default)]
    pub tmdb: TmdbConfig,
    /// Identity/store section.
    #[serde(default)]
    pub firebase: FirebaseConfig,
    /// Directory for the file log layer; stderr only when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load from the default config file (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(config_path()?)
    }

    /// Load from an explicit file (if present) and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("REELMARK")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

/// Default location of the configuration file.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Write the commented default configuration if no file exists yet.
pub fn ensure_default_config() -> Result<PathBuf, ConfigError> {
    let path = config_path()?;
    write_default_config(&path)?;
    Ok(path)
}

/// Write the default configuration to `path` unless it already exists.
pub fn write_default_config(path: &Path) -> Result<bool, ConfigError> {
    if path.exists() {
        return Ok(false);
    }

    let write_err = |source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, DEFAULT_CONFIG).map_err(write_err)?;
    info!(path = %path.display(), "wrote default configuration");
    Ok(true)
}
