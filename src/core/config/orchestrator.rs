use crate::core::config::data::Config;
use crate::core::config::io::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

#[derive(Default)]
struct ConfigCacheState {
    config: Option<Config>,
    modified: Option<SystemTime>,
}

/// Owns one config file: caches the parsed config until the file changes
/// on disk, and serializes read-modify-write cycles.
pub struct ConfigOrchestrator {
    path: PathBuf,
    state: Mutex<ConfigCacheState>,
}

impl ConfigOrchestrator {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: Mutex::new(ConfigCacheState::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, ConfigCacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refresh_cache(&self, state: &mut ConfigCacheState) -> Result<Config, ConfigError> {
        let disk_modified = Self::modified_time(&self.path);
        if state.config.is_none() || state.modified != disk_modified {
            let config = Config::load_from_path(&self.path)?;
            state.modified = disk_modified;
            state.config = Some(config);
        }
        Ok(state.config.clone().unwrap_or_default())
    }

    pub fn load_with_cache(&self) -> Result<Config, ConfigError> {
        let mut state = self.lock();
        self.refresh_cache(&mut state)
    }

    pub fn persist(&self, config: Config) -> Result<(), ConfigError> {
        config.save_to_path(&self.path)?;
        let mut state = self.lock();
        state.modified = Self::modified_time(&self.path);
        state.config = Some(config);
        Ok(())
    }

    /// Applies `mutator` to the current config and saves the result. Nothing
    /// is written when the mutator fails.
    pub fn mutate<F, T>(&self, mutator: F) -> Result<T, Box<dyn std::error::Error>>
    where
        F: FnOnce(&mut Config) -> Result<T, Box<dyn std::error::Error>>,
    {
        let mut working = {
            let mut state = self.lock();
            self.refresh_cache(&mut state)?
        };
        let result = mutator(&mut working)?;
        self.persist(working)?;
        Ok(result)
    }

    fn modified_time(path: &Path) -> Option<SystemTime> {
        fs::metadata(path).ok()?.modified().ok()
    }
}
