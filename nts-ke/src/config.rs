use std::{
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::daemon_tracing::LogLevel;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub nts_ke: NtsKeConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error while reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("config toml parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Config {
    /// Warns about settings that are accepted but unlikely to work.
    pub fn check(&self) -> bool {
        let mut ok = true;

        if self.nts_ke.connect_timeout_ms == 0 {
            warn!("A connect timeout of 0ms will make every key exchange fail");
            ok = false;
        }

        if self.nts_ke.server.is_none() {
            info!("No key exchange server configured, one must be given on the command line");
        }

        ok
    }

    async fn from_file(file: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let meta = std::fs::metadata(&file)?;
        let perm = meta.permissions();

        const S_IWOTH: u32 = 2;
        if perm.mode() & S_IWOTH != 0 {
            warn!("Unrestricted config file permissions: Others can write.");
        }

        let contents = tokio::fs::read_to_string(file).await?;
        Ok(toml::de::from_str(&contents)?)
    }

    pub async fn from_args(file: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let path = file.as_ref();
        info!(?path, "using config file");

        let config = Config::from_file(path).await?;

        Ok(config)
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, PartialEq, Eq, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct NtsKeConfig {
    /// Key exchange server as `host` or `host:port`
    #[serde(default)]
    pub server: Option<String>,
    /// PEM files with root certificates trusted next to the platform roots
    #[serde(default)]
    pub certificate_authority_paths: Vec<PathBuf>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
}

impl NtsKeConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for NtsKeConfig {
    fn default() -> Self {
        Self {
            server: None,
            certificate_authority_paths: vec![],
            connect_timeout_ms: default_connect_timeout(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    5000
}
