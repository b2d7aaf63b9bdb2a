// Path: crates/types/src/config.rs

//! Shared configuration structures for the Persona store and its binary.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Environment variable consulted when a passphrase key source carries no passphrase.
pub const PASSPHRASE_ENV: &str = "PERSONA_PASSPHRASE";

/// Default page size for projection-backed searches.
pub const DEFAULT_SEARCH_LIMIT: usize = 300;

/// Top-level configuration, usually loaded from `persona.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonaConfig {
    /// Path of the redb store file.
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    /// Where the encryption key comes from.
    #[serde(default)]
    pub key: KeySource,
    /// Search projection settings.
    #[serde(default)]
    pub search: SearchConfig,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("store.redb")
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            key: KeySource::default(),
            search: SearchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Selects how the store's key material is resolved at startup.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeySource {
    /// Derive the key from a passphrase. When `passphrase` is omitted the
    /// binary reads it from [`PASSPHRASE_ENV`].
    Passphrase {
        /// The passphrase itself.
        #[serde(default)]
        passphrase: Option<String>,
    },
    /// Use 32 random bytes persisted at `path`, generated on first use.
    KeyFile {
        /// Location of the raw key file.
        path: PathBuf,
    },
}

impl Default for KeySource {
    fn default() -> Self {
        Self::KeyFile {
            path: PathBuf::from("persona.key"),
        }
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passphrase { passphrase } => f
                .debug_struct("Passphrase")
                .field("passphrase", &passphrase.as_ref().map(|_| "<redacted>"))
                .finish(),
            Self::KeyFile { path } => f.debug_struct("KeyFile").field("path", path).finish(),
        }
    }
}

/// Settings for projection-backed searches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchConfig {
    /// Applied when a query does not set its own limit.
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,
}

fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
        }
    }
}

/// Output format of the global log subscriber.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human-readable lines.
    #[default]
    Pretty,
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct LoggingConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: PersonaConfig = toml::from_str("").unwrap();
        assert_eq!(config, PersonaConfig::default());
        assert_eq!(config.search.default_limit, 300);
        assert_eq!(config.data_path, PathBuf::from("store.redb"));
    }

    #[test]
    fn parses_passphrase_source() {
        let config: PersonaConfig = toml::from_str(
            r#"
            data_path = "/var/lib/persona/people.redb"

            [key]
            kind = "passphrase"
            passphrase = "correct horse"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.key,
            KeySource::Passphrase {
                passphrase: Some("correct horse".into())
            }
        );
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn debug_output_redacts_passphrase() {
        let source = KeySource::Passphrase {
            passphrase: Some("hunter2".into()),
        };
        let rendered = format!("{source:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
