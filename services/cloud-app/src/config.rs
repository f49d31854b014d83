//! Application configuration loaded from a YAML file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use gpv_fetch::FetchConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub fetch: FetchConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Directory the finished GIFs are written to and served from.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("static/images")
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config
            .fetch
            .validate()
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let yaml = r#"
fetch:
  base_url: "http://example.com/arch/"
  raw_data_dir: "data/raw"
  log_dir: "logs"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.render.output_dir, PathBuf::from("static/images"));
        assert_eq!(config.fetch.delay_hours, 2);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let yaml = r#"
fetch:
  base_url: "http://example.com/arch/"
  raw_data_dir: "data/raw"
  log_dir: "logs"
server:
  port: 8080
render:
  output_dir: "out"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.render.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(AppConfig::load(Path::new("/nonexistent/config.yaml")).is_err());
    }

    #[test]
    fn empty_cycle_set_is_rejected_at_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
fetch:
  base_url: "http://example.com/arch/"
  cycle_hours: []
  raw_data_dir: "data/raw"
  log_dir: "logs"
"#,
        )
        .unwrap();

        let err = AppConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("invalid config file"));
    }
}
