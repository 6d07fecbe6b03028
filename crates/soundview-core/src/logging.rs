//! Logging configuration.
//!
//! The core only defines the configuration surface; the application builds
//! the actual `tracing` subscriber from it so that library users can plug
//! the pipeline into their own logging setup.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// Configuration for log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum level: "trace", "debug", "info", "warn" or "error"
    pub level: String,
    /// Mirror logs to stderr
    pub console_output: bool,
    /// Write logs to a timestamped file under `log_dir`
    pub file_output: bool,
    /// Directory for log files
    pub log_dir: PathBuf,
    /// How many old log files to keep before cleanup removes the oldest
    pub max_log_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: true,
            log_dir: PathBuf::from("logs"),
            max_log_files: 10,
        }
    }
}

impl LogConfig {
    /// Parse the configured level, defaulting to `INFO` when unrecognized.
    pub fn parse_level(&self) -> LevelFilter {
        match self.level.to_lowercase().as_str() {
            "trace" => LevelFilter::TRACE,
            "debug" => LevelFilter::DEBUG,
            "warn" => LevelFilter::WARN,
            "error" => LevelFilter::ERROR,
            "off" => LevelFilter::OFF,
            _ => LevelFilter::INFO,
        }
    }

    /// Create the log directory if file output is enabled.
    pub fn ensure_log_directory(&self) -> io::Result<()> {
        if self.file_output {
            fs::create_dir_all(&self.log_dir)?;
        }
        Ok(())
    }

    /// Path for the current session's log file.
    pub fn current_log_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        self.log_dir.join(format!("soundview-{stamp}.log"))
    }

    /// Delete the oldest log files beyond `max_log_files`. Returns how many
    /// files were removed.
    pub fn cleanup_old_logs(&self) -> io::Result<usize> {
        if !self.file_output {
            return Ok(0);
        }

        let mut logs: Vec<(std::time::SystemTime, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.log_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|ext| ext == "log").unwrap_or(false) {
                let modified = entry.metadata()?.modified()?;
                logs.push((modified, path));
            }
        }

        if logs.len() <= self.max_log_files {
            return Ok(0);
        }

        // Oldest first.
        logs.sort_by_key(|(modified, _)| *modified);
        let excess = logs.len() - self.max_log_files;
        let mut removed = 0;
        for (_, path) in logs.into_iter().take(excess) {
            if fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        let mut config = LogConfig::default();
        assert_eq!(config.parse_level(), LevelFilter::INFO);

        config.level = "DEBUG".to_string();
        assert_eq!(config.parse_level(), LevelFilter::DEBUG);

        config.level = "nonsense".to_string();
        assert_eq!(config.parse_level(), LevelFilter::INFO);
    }

    #[test]
    fn test_log_path_under_configured_dir() {
        let config = LogConfig::default();
        let path = config.current_log_path();
        assert!(path.starts_with("logs"));
        assert_eq!(path.extension().unwrap(), "log");
    }

    #[test]
    fn test_cleanup_keeps_newest_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            log_dir: dir.path().to_path_buf(),
            max_log_files: 2,
            ..LogConfig::default()
        };

        for i in 0..4 {
            let path = dir.path().join(format!("soundview-{i}.log"));
            fs::write(&path, "x").unwrap();
        }

        let removed = config.cleanup_old_logs().unwrap();
        assert_eq!(removed, 2);

        let remaining = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(remaining, 2);
    }

    #[test]
    fn test_cleanup_noop_when_file_output_disabled() {
        let config = LogConfig {
            file_output: false,
            log_dir: PathBuf::from("/nonexistent"),
            ..LogConfig::default()
        };
        assert_eq!(config.cleanup_old_logs().unwrap(), 0);
    }
}
