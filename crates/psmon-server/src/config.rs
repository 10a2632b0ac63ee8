use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_http_host")]
    pub http_host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Directory holding the SQLite file; created with mode 0700
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_db_file")]
    pub db_file: String,
    /// Dashboard assets served at `/` and `/static`
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Seconds between disk usage samples
    #[serde(default = "default_sample_interval_secs")]
    pub sample_interval_secs: u64,
    /// Samples older than this many days are removed by the daily sweep
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default = "default_sampler_enabled")]
    pub sampler_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_host: default_http_host(),
            http_port: default_http_port(),
            data_dir: default_data_dir(),
            db_file: default_db_file(),
            static_dir: default_static_dir(),
            sample_interval_secs: default_sample_interval_secs(),
            retention_days: default_retention_days(),
            sampler_enabled: default_sampler_enabled(),
        }
    }
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8000
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_db_file() -> String {
    "psmon.db".to_string()
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_sample_interval_secs() -> u64 {
    600
}

fn default_retention_days() -> u32 {
    30
}

fn default_sampler_enabled() -> bool {
    true
}

impl ServerConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise falls back to defaults.
    pub fn load_or_default(path: &str) -> anyhow::Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            tracing::warn!(path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sample_interval_secs == 0 {
            anyhow::bail!("sample_interval_secs must be positive");
        }
        if self.retention_days == 0 {
            anyhow::bail!("retention_days must be positive");
        }
        if self.data_dir.trim().is_empty() {
            anyhow::bail!("data_dir must not be empty");
        }
        if self.db_file.trim().is_empty() {
            anyhow::bail!("db_file must not be empty");
        }
        Ok(())
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs)
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.http_port, 8000);
        assert_eq!(config.sample_interval_secs, 600);
        assert_eq!(config.retention_days, 30);
        assert!(config.sampler_enabled);
        config.validate().unwrap();
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let config: ServerConfig = toml::from_str(
            r#"
            http_port = 9000
            retention_days = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.retention_days, 7);
        assert_eq!(config.data_dir, "data");
        assert_eq!(config.http_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn zero_values_are_rejected() {
        let mut config = ServerConfig {
            retention_days: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        config.retention_days = 30;
        config.sample_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_validates_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        std::fs::write(&path, "sample_interval_secs = 0\n").unwrap();
        assert!(ServerConfig::load(path.to_str().unwrap()).is_err());

        std::fs::write(&path, "sample_interval_secs = 60\n").unwrap();
        let config = ServerConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.sample_interval(), Duration::from_secs(60));
    }

    #[test]
    fn bundled_config_file_is_valid() {
        let config: ServerConfig =
            toml::from_str(include_str!("../../../config/server.toml")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.http_addr(), "0.0.0.0:8000");
        assert_eq!(config.static_dir, "static");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = ServerConfig::load_or_default(path.to_str().unwrap()).unwrap();
        assert_eq!(config.retention_days, 30);
    }
}
