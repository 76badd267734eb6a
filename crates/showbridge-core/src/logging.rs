//! Logging configuration
//!
//! Describes where and how verbosely the bridge logs. The subscriber itself is
//! installed by the binary.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

use crate::Result;

const LOG_FILE_PREFIX: &str = "showbridge_";
const LOG_FILE_SUFFIX: &str = ".log";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Level name (`trace`, `debug`, `info`, `warn`, `error`)
    pub level: String,
    /// Log to stderr
    pub console_output: bool,
    /// Log to a daily file in `log_dir`
    pub file_output: bool,
    /// Directory for log files
    pub log_dir: PathBuf,
    /// Number of log files kept on startup
    pub max_log_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_dir: PathBuf::from("logs"),
            max_log_files: 10,
        }
    }
}

impl LogConfig {
    /// Parse the configured level, falling back to INFO
    pub fn parse_level(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::INFO)
    }

    /// Set the level name
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Enable file output into the given directory
    pub fn with_file_output(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.file_output = true;
        self.log_dir = log_dir.into();
        self
    }

    /// Create the log directory if file output is enabled
    pub fn ensure_log_directory(&self) -> Result<()> {
        if self.file_output {
            fs::create_dir_all(&self.log_dir)?;
        }
        Ok(())
    }

    /// Path of today's log file
    pub fn current_log_path(&self) -> PathBuf {
        let date = chrono::Local::now().format("%Y-%m-%d");
        self.log_dir
            .join(format!("{}{}{}", LOG_FILE_PREFIX, date, LOG_FILE_SUFFIX))
    }

    /// Remove the oldest log files beyond `max_log_files`.
    ///
    /// Returns the number of files removed.
    pub fn cleanup_old_logs(&self) -> Result<usize> {
        if !self.log_dir.is_dir() {
            return Ok(0);
        }

        let mut logs: Vec<PathBuf> = fs::read_dir(&self.log_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| n.starts_with(LOG_FILE_PREFIX) && n.ends_with(LOG_FILE_SUFFIX))
                        .unwrap_or(false)
            })
            .collect();

        if logs.len() <= self.max_log_files {
            return Ok(0);
        }

        // Dated names sort chronologically
        logs.sort();
        let excess = logs.len() - self.max_log_files;
        let mut removed = 0;
        for path in logs.into_iter().take(excess) {
            fs::remove_file(&path)?;
            removed += 1;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        let config = LogConfig::default();
        assert_eq!(config.parse_level(), LevelFilter::INFO);

        let config = LogConfig::default().with_level("debug");
        assert_eq!(config.parse_level(), LevelFilter::DEBUG);

        let config = LogConfig::default().with_level("loud");
        assert_eq!(config.parse_level(), LevelFilter::INFO);
    }

    #[test]
    fn test_current_log_path() {
        let config = LogConfig::default().with_file_output("/tmp/showbridge-logs");
        let path = config.current_log_path();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("showbridge_"));
        assert!(name.ends_with(".log"));
        assert!(path.starts_with("/tmp/showbridge-logs"));
    }

    #[test]
    fn test_cleanup_old_logs() {
        let dir = tempfile::tempdir().unwrap();
        for day in 1..=5 {
            let name = format!("showbridge_2024-01-0{}.log", day);
            fs::write(dir.path().join(name), "x").unwrap();
        }
        fs::write(dir.path().join("unrelated.txt"), "x").unwrap();

        let mut config = LogConfig::default().with_file_output(dir.path());
        config.max_log_files = 2;

        assert_eq!(config.cleanup_old_logs().unwrap(), 3);
        assert!(dir.path().join("showbridge_2024-01-05.log").exists());
        assert!(dir.path().join("showbridge_2024-01-04.log").exists());
        assert!(!dir.path().join("showbridge_2024-01-01.log").exists());
        assert!(dir.path().join("unrelated.txt").exists());
    }

    #[test]
    fn test_cleanup_missing_directory() {
        let config = LogConfig::default().with_file_output("/nonexistent/showbridge");
        assert_eq!(config.cleanup_old_logs().unwrap(), 0);
    }
}
