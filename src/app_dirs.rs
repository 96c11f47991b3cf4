use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "sociacube";
const DB_FILE: &str = "history.db";
const LOG_FILE: &str = "sociacube.log";
const CONFIG_FILE: &str = "config.json";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/sociacube`, or the platform data dir without `$HOME`
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join(APP_NAME),
            )
        } else {
            ProjectDirs::from("", "", APP_NAME).map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join(DB_FILE))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join(LOG_FILE))
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP_NAME).map(|pd| pd.config_dir().join(CONFIG_FILE))
    }
}

/// Files the binary reads and writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub db: PathBuf,
    pub log: PathBuf,
    pub config: PathBuf,
}

impl DataPaths {
    /// Everything under one directory, as `--data-dir` asks for
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            db: dir.join(DB_FILE),
            log: dir.join(LOG_FILE),
            config: dir.join(CONFIG_FILE),
        }
    }

    pub fn resolve(data_dir: Option<&Path>) -> Self {
        if let Some(dir) = data_dir {
            return Self::in_dir(dir);
        }
        Self {
            db: AppDirs::db_path().unwrap_or_else(|| PathBuf::from(DB_FILE)),
            log: AppDirs::log_path().unwrap_or_else(|| PathBuf::from(LOG_FILE)),
            config: AppDirs::config_path().unwrap_or_else(|| PathBuf::from(CONFIG_FILE)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_overrides_everything() {
        let paths = DataPaths::resolve(Some(Path::new("/tmp/cube")));
        assert_eq!(paths.db, PathBuf::from("/tmp/cube/history.db"));
        assert_eq!(paths.log, PathBuf::from("/tmp/cube/sociacube.log"));
        assert_eq!(paths.config, PathBuf::from("/tmp/cube/config.json"));
    }

    #[test]
    fn test_files_live_in_state_dir() {
        if let (Some(state), Some(db), Some(log)) =
            (AppDirs::state_dir(), AppDirs::db_path(), AppDirs::log_path())
        {
            assert_eq!(db.parent(), Some(state.as_path()));
            assert_eq!(log.parent(), Some(state.as_path()));
        }
    }
}
