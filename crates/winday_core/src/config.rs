//! Per-process settings for opening the tracker.
//!
//! Values arrive already resolved (command-line flags, environment or
//! defaults are the caller's concern); this type only normalizes them.

use crate::logging::default_log_level;
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_FILE_NAME: &str = "winday.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Directory for rolling log files; `None` keeps logging off.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Log directory anchored at `base` when given relative.
    pub fn log_dir_under(&self, base: &Path) -> Option<PathBuf> {
        self.log_dir.as_ref().map(|dir| {
            if dir.is_absolute() {
                dir.clone()
            } else {
                base.join(dir)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, DEFAULT_DB_FILE_NAME};
    use std::path::{Path, PathBuf};

    #[test]
    fn default_keeps_logging_off() {
        let config = CoreConfig::default();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_FILE_NAME));
        assert!(config.log_dir_under(Path::new("/srv")).is_none());
    }

    #[test]
    fn relative_log_dir_is_joined_to_base() {
        let mut config = CoreConfig {
            log_dir: Some(PathBuf::from("logs")),
            ..CoreConfig::default()
        };
        assert_eq!(
            config.log_dir_under(Path::new("/srv/winday")),
            Some(PathBuf::from("/srv/winday/logs"))
        );

        config.log_dir = Some(PathBuf::from("/var/log/winday"));
        assert_eq!(
            config.log_dir_under(Path::new("/srv/winday")),
            Some(PathBuf::from("/var/log/winday"))
        );
    }
}
