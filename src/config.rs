use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::Level;

use crate::error::SqlEmulatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Local emulator for a hosted SQLite pipeline service")]
pub struct Args {
    /// Address the HTTP server binds to.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,
    /// Directory holding one `<name>.db` file per database.
    #[arg(long, default_value = ".sql-emulator")]
    pub db_dir: PathBuf,
    /// Domain appended to database names in management responses.
    #[arg(long, default_value = "localhost")]
    pub hostname_suffix: String,
    /// Also write logs to this file.
    #[arg(long)]
    pub log: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

/// Settings the server runs with, logged once at startup.
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub db_dir: PathBuf,
    pub hostname_suffix: String,
    pub log: Option<PathBuf>,
    pub log_level: LogLevel,
}

impl ServerConfig {
    /// Defaults for everything but the database directory.
    pub fn new(db_dir: impl Into<PathBuf>) -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
            db_dir: db_dir.into(),
            hostname_suffix: "localhost".to_string(),
            log: None,
            log_level: LogLevel::Info,
        }
    }

    #[must_use]
    pub fn from_args(args: Args) -> Self {
        Self {
            listen: args.listen,
            db_dir: args.db_dir,
            hostname_suffix: normalize_suffix(&args.hostname_suffix),
            log: args.log,
            log_level: args.log_level,
        }
    }

    /// Reject settings the server cannot start with.
    ///
    /// # Errors
    /// Returns `SqlEmulatorError::ConfigError` naming the offending setting.
    pub fn validate(&self) -> Result<(), SqlEmulatorError> {
        if self.db_dir.as_os_str().is_empty() {
            return Err(SqlEmulatorError::ConfigError(
                "--db-dir must not be empty".to_string(),
            ));
        }
        let valid_suffix = self
            .hostname_suffix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
        if !valid_suffix {
            return Err(SqlEmulatorError::ConfigError(format!(
                "--hostname-suffix {:?} is not a hostname",
                self.hostname_suffix
            )));
        }
        Ok(())
    }
}

fn normalize_suffix(suffix: &str) -> String {
    let suffix = suffix.trim().trim_matches('.');
    if suffix.is_empty() {
        "localhost".to_string()
    } else {
        suffix.to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_local_setup() {
        let config = ServerConfig::from_args(Args::parse_from(["sql-emulator"]));
        assert_eq!(config.listen, SocketAddr::from(([127, 0, 0, 1], 8080)));
        assert_eq!(config.db_dir, PathBuf::from(".sql-emulator"));
        assert_eq!(config.hostname_suffix, "localhost");
        assert_eq!(config.log, None);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "sql-emulator",
            "--listen",
            "0.0.0.0:9000",
            "--db-dir",
            "/tmp/dbs",
            "--hostname-suffix",
            ".Example.test.",
            "--log-level",
            "debug",
        ]);
        let config = ServerConfig::from_args(args);
        assert_eq!(config.listen.port(), 9000);
        assert_eq!(config.db_dir, PathBuf::from("/tmp/dbs"));
        assert_eq!(config.hostname_suffix, "example.test");
        assert_eq!(Level::from(config.log_level), Level::DEBUG);
    }

    #[test]
    fn validate_rejects_unusable_settings() {
        assert!(ServerConfig::new("data").validate().is_ok());
        assert!(matches!(
            ServerConfig::new("").validate(),
            Err(SqlEmulatorError::ConfigError(_))
        ));
        let mut config = ServerConfig::new("data");
        config.hostname_suffix = "bad host/".to_string();
        assert!(matches!(
            config.validate(),
            Err(SqlEmulatorError::ConfigError(_))
        ));
    }

    #[test]
    fn config_serializes_for_the_startup_log() {
        let json = serde_json::to_value(ServerConfig::new("data")).unwrap();
        assert_eq!(json["db_dir"], "data");
        assert_eq!(json["log_level"], "info");
        assert_eq!(json["listen"], "127.0.0.1:8080");
    }
}
