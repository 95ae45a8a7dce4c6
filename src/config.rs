// Persistent CLI configuration and target resolution.
//
// The configuration lives in `<home>/.vespa/config.json`, where `<home>` is
// `$VESPA_CLI_HOME` when set and the user's home directory otherwise.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const HOME_ENV: &str = "VESPA_CLI_HOME";
pub const DEFAULT_TARGET: &str = "local";

const LOCAL_CONTAINER: &str = "http://127.0.0.1:8080";
const LOCAL_CONFIG_SERVER: &str = "http://127.0.0.1:19071";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No home directory found; set VESPA_CLI_HOME")]
    NoHome,
    #[error("Could not read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("Could not write config file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Unknown config key '{0}', expected one of: target")]
    UnknownKey(String),
    #[error(transparent)]
    Target(#[from] TargetError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("Unknown target '{0}': use 'local' or an http(s) URL")]
    Unknown(String),
}

/// The role of a service a command talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Query,
    Document,
    Deploy,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceKind::Query => "query",
            ServiceKind::Document => "document",
            ServiceKind::Deploy => "deploy",
        })
    }
}

/// Base URL of the given service for a target name or URL, without a
/// trailing slash.
pub fn resolve_target(target: &str, kind: ServiceKind) -> Result<String, TargetError> {
    if target == DEFAULT_TARGET {
        return Ok(match kind {
            ServiceKind::Query | ServiceKind::Document => LOCAL_CONTAINER.to_string(),
            ServiceKind::Deploy => LOCAL_CONFIG_SERVER.to_string(),
        });
    }
    if target.starts_with("http://") || target.starts_with("https://") {
        return Ok(target.trim_end_matches('/').to_string());
    }
    Err(TargetError::Unknown(target.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_target")]
    pub target: String,
}

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            target: default_target(),
        }
    }
}

impl Config {
    /// Path of the config file, honouring `$VESPA_CLI_HOME`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = match std::env::var_os(HOME_ENV) {
            Some(home) => PathBuf::from(home),
            None => dirs::home_dir().ok_or(ConfigError::NoHome)?,
        };
        Ok(home.join(".vespa").join("config.json"))
    }

    /// Loads the config, or the defaults when the file does not exist yet.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_slice(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(write_err)?;
        }
        let mut data = serde_json::to_vec_pretty(self).map_err(|e| write_err(e.into()))?;
        data.push(b'\n');
        fs::write(path, data).map_err(write_err)
    }

    pub fn get(&self, key: &str) -> Result<&str, ConfigError> {
        match key {
            "target" => Ok(self.target.as_str()),
            other => Err(ConfigError::UnknownKey(other.to_string())),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "target" => {
                resolve_target(value, ServiceKind::Query)?;
                self.target = value.to_string();
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// All keys with their values.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        vec![("target", self.target.as_str())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_target_per_service() {
        assert_eq!(
            resolve_target("local", ServiceKind::Document).unwrap(),
            "http://127.0.0.1:8080"
        );
        assert_eq!(
            resolve_target("local", ServiceKind::Query).unwrap(),
            "http://127.0.0.1:8080"
        );
        assert_eq!(
            resolve_target("local", ServiceKind::Deploy).unwrap(),
            "http://127.0.0.1:19071"
        );
    }

    #[test]
    fn url_target_drops_trailing_slash() {
        assert_eq!(
            resolve_target("https://vespa.example.com:4443/", ServiceKind::Document).unwrap(),
            "https://vespa.example.com:4443"
        );
        assert_eq!(
            resolve_target("cloud", ServiceKind::Query),
            Err(TargetError::Unknown("cloud".into()))
        );
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.target, "local");
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".vespa").join("config.json");

        let mut config = Config::default();
        config.set("target", "http://127.0.0.1:9090").unwrap();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.get("target").unwrap(), "http://127.0.0.1:9090");
        assert_eq!(loaded.entries(), vec![("target", "http://127.0.0.1:9090")]);
    }

    #[test]
    fn rejects_bad_keys_and_targets() {
        let mut config = Config::default();
        assert!(matches!(config.get("color"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(
            config.set("application", "tenant.app"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            config.set("target", "nowhere"),
            Err(ConfigError::Target(TargetError::Unknown(_)))
        ));
        assert_eq!(config.target, "local");
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));
    }
}
