//! Runtime configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Settings for the session worker and its surroundings.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub command_buffer_size: usize,
    pub event_buffer_size: usize,
    /// How often the worker polls the targeter session while idle.
    pub poll_interval: Duration,
    /// Content root; script locations in saves resolve against it.
    pub data_dir: PathBuf,
    /// Log directory. `None` uses the platform cache directory.
    pub log_dir: Option<PathBuf>,
    pub file_logging: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_buffer_size: 32,
            event_buffer_size: 100,
            poll_interval: Duration::from_millis(16),
            data_dir: PathBuf::from("data"),
            log_dir: None,
            file_logging: true,
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `TACTICS_COMMAND_BUFFER` - Command queue size (default: 32)
    /// - `TACTICS_EVENT_BUFFER` - Per-topic event capacity (default: 100)
    /// - `TACTICS_POLL_INTERVAL_MS` - Targeter poll interval (default: 16)
    /// - `TACTICS_DATA_DIR` - Content root (default: `data`)
    /// - `TACTICS_LOG_DIR` - Log directory (default: platform cache dir)
    /// - `TACTICS_FILE_LOG` - Write a log file (default: true)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(size) = read_env::<usize>("TACTICS_COMMAND_BUFFER") {
            config.command_buffer_size = size.max(1);
        }
        if let Some(size) = read_env::<usize>("TACTICS_EVENT_BUFFER") {
            config.event_buffer_size = size.max(1);
        }
        if let Some(ms) = read_env::<u64>("TACTICS_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(ms.max(1));
        }
        if let Some(dir) = read_env::<PathBuf>("TACTICS_DATA_DIR") {
            config.data_dir = dir;
        }
        if let Some(dir) = read_env::<PathBuf>("TACTICS_LOG_DIR") {
            config.log_dir = Some(dir);
        }
        if let Some(enabled) = read_env_bool("TACTICS_FILE_LOG") {
            config.file_logging = enabled;
        }

        config
    }

    /// Configured log directory, or the platform default.
    pub fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(default_log_dir)
    }
}

/// Platform cache directory for logs, falling back to `/tmp/tactics/logs`.
pub fn default_log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "tactics")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/tactics"))
        .join("logs")
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

fn read_env_bool(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_log_dir_wins() {
        let config = RuntimeConfig {
            log_dir: Some(PathBuf::from("/var/log/tactics")),
            ..RuntimeConfig::default()
        };
        assert_eq!(config.resolved_log_dir(), PathBuf::from("/var/log/tactics"));
        assert!(default_log_dir().ends_with("logs"));
    }
}
