//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be opened or read.
    #[error("cannot read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file content is not a valid configuration document.
    #[error("cannot parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Resolve the configuration file, if any.
///
/// `None` yields the built-in defaults. The file is read once and nothing
/// else is touched, so the same content always resolves to the same value.
pub fn resolve(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    match path {
        None => Ok(ServerConfig::default()),
        Some(path) => load_config(path),
    }
}

/// Load configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn no_path_gives_defaults() {
        assert_eq!(resolve(None).unwrap(), ServerConfig::default());
        assert_eq!(resolve(None).unwrap(), resolve(None).unwrap());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let file = write_config("port = 9000\napi_tokens = [\"secret\"]\n");
        let config = resolve(Some(file.path())).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.api_tokens, vec!["secret".to_string()]);
        assert!(config.auth_enabled);
        assert_eq!(config.interface, "0.0.0.0");
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = resolve(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let file = write_config("port = = 1");
        let err = resolve(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn unknown_key_is_parse_error() {
        let file = write_config("prot = 9000\n");
        assert!(matches!(
            resolve(Some(file.path())),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn wrong_type_is_parse_error() {
        let file = write_config("port = \"eighty\"\n");
        assert!(matches!(
            resolve(Some(file.path())),
            Err(ConfigError::Parse { .. })
        ));
    }
}
