// Path: crates/cli/src/util.rs

use anyhow::{Context, Result};
use persona_types::config::{KeySource, PersonaConfig, PASSPHRASE_ENV};
use serde::Serialize;
use std::path::Path;

/// Reads the TOML configuration, falling back to defaults when the file does
/// not exist.
pub fn load_config(path: &Path) -> Result<PersonaConfig> {
    if !path.exists() {
        return Ok(PersonaConfig::default());
    }
    let cfg_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let cfg: PersonaConfig =
        toml::from_str(&cfg_str).with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(cfg)
}

/// Fills a passphrase source without a passphrase from the environment.
pub fn key_source_with_env(source: KeySource) -> KeySource {
    passphrase_from(source, std::env::var(PASSPHRASE_ENV).ok())
}

fn passphrase_from(source: KeySource, env: Option<String>) -> KeySource {
    match source {
        KeySource::Passphrase { passphrase: None } => KeySource::Passphrase { passphrase: env },
        other => other,
    }
}

/// Pretty-prints `value` as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_types::config::LogFormat;
    use std::path::PathBuf;

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, PersonaConfig::default());
    }

    #[test]
    fn config_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persona.toml");
        std::fs::write(
            &path,
            "data_path = \"people.redb\"\n[key]\nkind = \"key_file\"\npath = \"k.bin\"\n[logging]\nformat = \"json\"\n",
        )
        .unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.data_path, PathBuf::from("people.redb"));
        assert_eq!(
            cfg.key,
            KeySource::KeyFile {
                path: PathBuf::from("k.bin")
            }
        );
        assert_eq!(cfg.logging.format, LogFormat::Json);
    }

    #[test]
    fn invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persona.toml");
        std::fs::write(&path, "data_path = 5").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn environment_only_fills_a_missing_passphrase() {
        let filled = passphrase_from(
            KeySource::Passphrase { passphrase: None },
            Some("from-env".into()),
        );
        assert_eq!(
            filled,
            KeySource::Passphrase {
                passphrase: Some("from-env".into())
            }
        );

        let explicit = KeySource::Passphrase {
            passphrase: Some("from-file".into()),
        };
        assert_eq!(passphrase_from(explicit.clone(), Some("from-env".into())), explicit);

        let file = KeySource::default();
        assert_eq!(passphrase_from(file.clone(), Some("from-env".into())), file);
    }
}
