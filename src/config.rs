use crate::identity::Identity;
use crate::puzzle::PuzzleVariant;
use crate::timer::DEFAULT_INSPECTION_SECS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub puzzle: PuzzleVariant,
    pub inspection_secs: u32,
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub firestore_project: Option<String>,
    pub sync_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            puzzle: PuzzleVariant::default(),
            inspection_secs: DEFAULT_INSPECTION_SECS,
            username: None,
            name: None,
            email: None,
            firestore_project: None,
            sync_enabled: false,
        }
    }
}

impl Config {
    pub fn identity(&self) -> Identity {
        Identity {
            username: self.username.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    /// Firestore project to mirror into, when syncing is switched on
    pub fn sync_project(&self) -> Option<&str> {
        if !self.sync_enabled {
            return None;
        }
        self.firestore_project
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => cfg,
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), error = %err, "ignoring unreadable config");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
