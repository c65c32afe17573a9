use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use debtbook_stats::CurrencyFormat;
use debtbook_store::{
    JsonFileBackend, LedgerBackend, MemoryBackend, RestBackend, RestConfig, StorageError,
    StoreConfig,
};
use debtbook_types::OwnerRef;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides `backend.api_key`.
pub const API_KEY_ENV: &str = "DEBTBOOK_API_KEY";

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "debtbook.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("backend.{0} is required for the rest backend")]
    Missing(&'static str),

    #[error(transparent)]
    Backend(#[from] StorageError),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebtbookConfig {
    pub store: StoreSection,
    pub backend: BackendSection,
    pub display: CurrencyFormat,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub call_timeout_ms: u64,
    pub owner: Option<String>,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            call_timeout_ms: 10_000,
            owner: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    Rest,
    Memory,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    pub kind: BackendKind,
    /// Ledger file for the `file` backend.
    pub path: PathBuf,
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub cascades: bool,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            kind: BackendKind::File,
            path: PathBuf::from("debtbook.json"),
            url: None,
            api_key: None,
            cascades: true,
        }
    }
}

impl DebtbookConfig {
    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment overrides. A blank value is ignored.
    pub fn apply_env(&mut self, api_key: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            self.backend.api_key = Some(key);
        }
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            call_timeout: Duration::from_millis(self.store.call_timeout_ms),
            owner: self.store.owner.as_deref().map(OwnerRef::new),
        }
    }

    pub fn open_backend(&self) -> Result<Arc<dyn LedgerBackend>, ConfigError> {
        let backend: Arc<dyn LedgerBackend> = match self.backend.kind {
            BackendKind::File => Arc::new(JsonFileBackend::new(&self.backend.path)),
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
            BackendKind::Rest => {
                let base_url = self.backend.url.clone().ok_or(ConfigError::Missing("url"))?;
                let api_key = self
                    .backend
                    .api_key
                    .clone()
                    .ok_or(ConfigError::Missing("api_key"))?;
                Arc::new(RestBackend::new(RestConfig {
                    base_url,
                    api_key,
                    cascades: self.backend.cascades,
                })?)
            }
        };
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = DebtbookConfig::default();
        assert_eq!(c.backend.kind, BackendKind::File);
        assert_eq!(c.backend.path, PathBuf::from("debtbook.json"));
        assert_eq!(c.store.call_timeout_ms, 10_000);
        assert_eq!(c.display.symbol, "Rp");
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = DebtbookConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(c, DebtbookConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debtbook.toml");
        std::fs::write(
            &path,
            r#"
[store]
owner = "user-1"

[backend]
kind = "rest"
url = "https://example.supabase.co"

[display]
symbol = "$"
fraction_digits = 2
"#,
        )
        .unwrap();

        let c = DebtbookConfig::load(&path).unwrap();
        assert_eq!(c.backend.kind, BackendKind::Rest);
        assert_eq!(c.store.call_timeout_ms, 10_000);
        assert_eq!(c.display.thousands_separator, '.');
        assert_eq!(c.display.fraction_digits, 2);
        assert_eq!(
            c.store_config().owner,
            Some(OwnerRef::new("user-1"))
        );
    }

    #[test]
    fn invalid_toml_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[backend\nkind = ").unwrap();
        let err = DebtbookConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn unknown_backend_kind_is_rejected() {
        assert!(toml::from_str::<DebtbookConfig>("[backend]\nkind = \"ftp\"").is_err());
    }

    #[test]
    fn env_key_overrides_file_key() {
        let mut c = DebtbookConfig::default();
        c.backend.api_key = Some("from-file".into());
        c.apply_env(Some("from-env".into()));
        assert_eq!(c.backend.api_key.as_deref(), Some("from-env"));
        c.apply_env(Some("  ".into()));
        assert_eq!(c.backend.api_key.as_deref(), Some("from-env"));
        c.apply_env(None);
        assert_eq!(c.backend.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn rest_backend_needs_url_and_key() {
        let mut c = DebtbookConfig::default();
        c.backend.kind = BackendKind::Rest;
        assert!(matches!(c.open_backend(), Err(ConfigError::Missing("url"))));
        c.backend.url = Some("http://localhost:54321".into());
        assert!(matches!(c.open_backend(), Err(ConfigError::Missing("api_key"))));
        c.backend.api_key = Some("anon".into());
        assert!(c.open_backend().is_ok());
    }

    #[test]
    fn timeout_converts_to_duration() {
        let mut c = DebtbookConfig::default();
        c.store.call_timeout_ms = 250;
        assert_eq!(c.store_config().call_timeout, Duration::from_millis(250));
    }
}
