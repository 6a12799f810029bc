use serde::Deserialize;
use std::{env, fs, path::Path};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config.json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("PORT must be a number between 0 and 65535, got {0:?}")]
    InvalidPort(String),
}

/// Which persistence backend to run against.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// HTTP port to listen on. `PORT` overrides it.
    pub port: u16,

    /// Log level for tracing (e.g. "info", "debug").
    pub log_level: String,

    pub server_version: String,

    #[serde(default)]
    pub backend: BackendKind,

    /// SQLite database file, only used with the `sqlite` backend.
    /// `DATABASE_PATH` overrides it.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Insert the five demo countries when the backend starts empty.
    #[serde(default = "default_true")]
    pub seed_demo_data: bool,

    /// Directory holding index.html and friends.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_database_path() -> String {
    "banana_index.db".to_string()
}

fn default_static_dir() -> String {
    "public".to_string()
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json(&file)?
            .relative_to(base)
            .with_overrides(env::var("PORT").ok(), env::var("DATABASE_PATH").ok())
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str::<AppConfig>(text)?)
    }

    /// Anchor a relative `static_dir` at `base` (the config file's directory),
    /// so the page is found no matter where the binary is started from.
    pub fn relative_to(mut self, base: &Path) -> Self {
        let static_dir = Path::new(&self.static_dir);
        if static_dir.is_relative() {
            self.static_dir = base.join(static_dir).display().to_string();
        }
        self
    }

    /// Apply the `PORT` / `DATABASE_PATH` environment overrides.
    pub fn with_overrides(
        mut self,
        port: Option<String>,
        database_path: Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = port {
            self.port = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?;
        }
        if let Some(path) = database_path.filter(|p| !p.trim().is_empty()) {
            self.database_path = path;
        }
        Ok(self)
    }

    /// Map `log_level` to a tracing filter; unknown values fall back to INFO.
    pub fn level_filter(&self) -> LevelFilter {
        match self.log_level.to_lowercase().as_str() {
            "trace" => LevelFilter::TRACE,
            "debug" => LevelFilter::DEBUG,
            "info" => LevelFilter::INFO,
            "warn" => LevelFilter::WARN,
            "error" => LevelFilter::ERROR,
            _ => LevelFilter::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "port": 3000,
        "log_level": "info",
        "server_version": "0.1.0"
    }"#;

    #[test]
    fn optional_fields_get_defaults() {
        let cfg = AppConfig::from_json(MINIMAL).unwrap();

        assert_eq!(cfg.backend, BackendKind::Memory);
        assert_eq!(cfg.database_path, "banana_index.db");
        assert!(cfg.seed_demo_data);
        assert_eq!(cfg.static_dir, "public");
    }

    #[test]
    fn backend_kind_is_lowercase() {
        let cfg = AppConfig::from_json(
            r#"{"port": 1, "log_level": "debug", "server_version": "x", "backend": "sqlite"}"#,
        )
        .unwrap();

        assert_eq!(cfg.backend, BackendKind::Sqlite);
        assert!(AppConfig::from_json(
            r#"{"port": 1, "log_level": "debug", "server_version": "x", "backend": "postgres"}"#,
        )
        .is_err());
    }

    #[test]
    fn env_overrides_win() {
        let cfg = AppConfig::from_json(MINIMAL)
            .unwrap()
            .with_overrides(Some("8080".into()), Some("/tmp/bananas.db".into()))
            .unwrap();

        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.database_path, "/tmp/bananas.db");
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let err = AppConfig::from_json(MINIMAL)
            .unwrap()
            .with_overrides(Some("eighty".into()), None)
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidPort(_)));
    }

    #[test]
    fn level_filter_falls_back_to_info() {
        let mut cfg = AppConfig::from_json(MINIMAL).unwrap();
        cfg.log_level = "WARN".into();
        assert_eq!(cfg.level_filter(), LevelFilter::WARN);

        cfg.log_level = "chatty".into();
        assert_eq!(cfg.level_filter(), LevelFilter::INFO);
    }

    #[test]
    fn load_from_file_reads_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, MINIMAL).unwrap();

        let cfg = AppConfig::load_from_file(&path).unwrap();

        assert_eq!(cfg.server_version, "0.1.0");
        assert_eq!(Path::new(&cfg.static_dir), dir.path().join("public"));
    }

    #[test]
    fn static_dir_is_anchored_at_the_config_directory() {
        let base = Path::new("/opt/banana-index");

        let relative = AppConfig::from_json(MINIMAL).unwrap().relative_to(base);
        assert_eq!(Path::new(&relative.static_dir), base.join("public"));

        let mut absolute = AppConfig::from_json(MINIMAL).unwrap();
        absolute.static_dir = "/srv/www".into();
        assert_eq!(absolute.relative_to(base).static_dir, "/srv/www");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AppConfig::load_from_file(Path::new("/definitely/not/here.json")).unwrap_err();

        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
