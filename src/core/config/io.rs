use crate::core::config::data::{path_display, Config};
use crate::core::expansion::{ExpansionSnapshot, ExpansionStore};
use directories::ProjectDirs;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const CONFIG_FILE: &str = "config.toml";

/// Errors raised while reading or writing configuration and saved state.
#[derive(Debug)]
pub enum ConfigError {
    /// No home directory to derive the config and data dirs from.
    NoProjectDirs,

    /// Failed to read a file from disk.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid TOML for the expected shape.
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    Serialize(toml::ser::Error),

    /// Creating, writing or persisting the file failed.
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ConfigError {
    fn display_path(path: &Path) -> String {
        path_display(path)
    }

    fn write(path: &Path, source: std::io::Error) -> Self {
        ConfigError::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoProjectDirs => {
                write!(f, "Failed to determine the config directory")
            }
            ConfigError::Read { path, source } => {
                write!(
                    f,
                    "Failed to read {}: {}",
                    Self::display_path(path),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "Failed to parse {}: {}",
                    Self::display_path(path),
                    source
                )
            }
            ConfigError::Serialize(source) => write!(f, "Failed to serialize: {source}"),
            ConfigError::Write { path, source } => {
                write!(
                    f,
                    "Failed to write {}: {}",
                    Self::display_path(path),
                    source
                )
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::NoProjectDirs => None,
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Serialize(source) => Some(source),
            ConfigError::Write { source, .. } => Some(source),
        }
    }
}

pub fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("org", "permacommons", "chabeau-sidebar").ok_or(ConfigError::NoProjectDirs)
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.config_dir().join(CONFIG_FILE))
}

pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

fn read_toml<T>(path: &Path) -> Result<Option<T>, ConfigError>
where
    T: serde::de::DeserializeOwned,
{
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes through a temp file in the target directory so readers never see
/// a half-written file.
fn write_toml<T: serde::Serialize>(value: &T, path: &Path) -> Result<(), ConfigError> {
    let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());

    if let Some(dir) = parent {
        fs::create_dir_all(dir).map_err(|err| ConfigError::write(dir, err))?;
    }

    let contents = toml::to_string_pretty(value).map_err(ConfigError::Serialize)?;
    let mut temp_file = match parent {
        Some(dir) => NamedTempFile::new_in(dir),
        None => NamedTempFile::new(),
    }
    .map_err(|err| ConfigError::write(path, err))?;

    temp_file
        .write_all(contents.as_bytes())
        .and_then(|()| temp_file.as_file_mut().sync_all())
        .map_err(|err| ConfigError::write(path, err))?;
    temp_file
        .persist(path)
        .map_err(|err| ConfigError::write(path, err.error))?;
    Ok(())
}

impl Config {
    pub fn load_from_path(config_path: &Path) -> Result<Config, ConfigError> {
        Ok(read_toml(config_path)?.unwrap_or_default())
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<(), ConfigError> {
        write_toml(self, config_path)
    }
}

/// Loads saved fold state; a missing file is an empty store.
pub fn load_expansion(path: &Path) -> Result<ExpansionStore, ConfigError> {
    let snapshot: Option<ExpansionSnapshot> = read_toml(path)?;
    Ok(snapshot
        .map(ExpansionStore::from_snapshot)
        .unwrap_or_default())
}

pub fn save_expansion(store: &ExpansionStore, path: &Path) -> Result<(), ConfigError> {
    write_toml(&store.snapshot(), path)
}
