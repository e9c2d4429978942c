//! Configuration management.
//!
//! Settings resolve in order: built-in defaults, then a `manifesto.toml`
//! in the data directory, then environment variables (`DATABASE_URL`,
//! `MANIFESTO_TENANT`). CLI flags override all of these at the call
//! site.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::repository::AsyncSqlitePool;

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "manifesto.db";

/// Default tenant used when none is configured.
pub const DEFAULT_TENANT: &str = "default";

/// Config filename looked up inside the data directory.
const CONFIG_FILENAME: &str = "manifesto.toml";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    /// Set via DATABASE_URL env var or config file.
    pub database_url: Option<String>,
    /// Tenant scoping all operations.
    pub default_tenant: String,
}

impl Default for Settings {
    fn default() -> Self {
        // Data lives under the platform data dir, falling back to the
        // home directory and finally the current directory.
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("manifesto");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            default_tenant: DEFAULT_TENANT.to_string(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Load settings: defaults, then the config file in the data
    /// directory (or the given override), then the environment.
    pub fn load(data_dir: Option<PathBuf>) -> Self {
        let mut settings = match data_dir {
            Some(dir) => Self::with_data_dir(dir),
            None => Self::default(),
        };

        let config_path = settings.data_dir.join(CONFIG_FILENAME);
        if config_path.exists() {
            match ConfigFile::load_from_path(&config_path) {
                Ok(file) => file.apply(&mut settings),
                Err(e) => tracing::warn!("ignoring {}: {}", config_path.display(), e),
            }
        }

        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                settings.database_url = Some(url);
            }
        }
        if let Ok(tenant) = std::env::var("MANIFESTO_TENANT") {
            if !tenant.is_empty() {
                settings.default_tenant = tenant;
            }
        }

        settings
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            let path = self.data_dir.join(&self.database_filename);
            format!("sqlite:{}", path.display())
        }
    }

    /// Get the full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Check if the database appears to be initialized.
    pub fn database_exists(&self) -> bool {
        if self.database_url.is_some() {
            true
        } else {
            self.database_path().exists()
        }
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)
    }

    /// Build a connection pool against the configured database.
    pub fn pool(&self) -> AsyncSqlitePool {
        if let Some(ref url) = self.database_url {
            AsyncSqlitePool::new(url)
        } else {
            AsyncSqlitePool::from_path(&self.database_path())
        }
    }
}

/// On-disk config file shape. Every field is optional; absent fields
/// keep their defaults.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database_filename: Option<String>,
    pub database_url: Option<String>,
    pub default_tenant: Option<String>,
}

impl ConfigFile {
    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
        toml::from_str(&content).map_err(|e| e.to_string())
    }

    fn apply(self, settings: &mut Settings) {
        if let Some(filename) = self.database_filename {
            settings.database_filename = filename;
        }
        if let Some(url) = self.database_url {
            settings.database_url = Some(url);
        }
        if let Some(tenant) = self.default_tenant {
            settings.default_tenant = tenant;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_database_url_from_path() {
        let settings = Settings::with_data_dir(PathBuf::from("/tmp/mfst"));
        assert_eq!(settings.database_url(), "sqlite:/tmp/mfst/manifesto.db");
    }

    #[test]
    fn test_pool_targets_database_path() {
        let settings = Settings::with_data_dir(PathBuf::from("/tmp/mfst"));
        assert_eq!(
            settings.pool().database_url(),
            settings.database_path().display().to_string()
        );
    }

    #[test]
    fn test_explicit_url_wins() {
        let settings = Settings {
            database_url: Some("sqlite:/elsewhere/db.sqlite".to_string()),
            ..Settings::with_data_dir(PathBuf::from("/tmp/mfst"))
        };
        assert_eq!(settings.database_url(), "sqlite:/elsewhere/db.sqlite");
    }

    #[test]
    fn test_config_file_overrides() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            "database_filename = \"other.db\"\ndefault_tenant = \"acme\"\n",
        )
        .unwrap();

        let settings = Settings::load(Some(dir.path().to_path_buf()));
        assert_eq!(settings.database_filename, "other.db");
        assert_eq!(settings.default_tenant, "acme");
    }
}
