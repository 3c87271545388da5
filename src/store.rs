// ABOUTME: Preferences persistence for the bibslide application
// ABOUTME: Keeps style, chunking and theme choices between sessions

use crate::color::Theme;
use crate::content::{ChunkingParameters, StyleOptions};
use crate::errors::{Result, SlideError};
use crate::utils::write_atomically;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "bibslide";
const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// User choices that survive mode switches and restarts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub style: StyleOptions,
    pub chunking: ChunkingParameters,
    pub theme: Theme,
    pub church_name: Option<String>,
}

/// Load/save port for preferences
pub trait PreferencesStore {
    fn load(&self) -> Result<Preferences>;
    fn save(&self, preferences: &Preferences) -> Result<()>;
}

/// `{config_dir}/bibslide/preferences.json`
pub fn default_preferences_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|base| base.join(APP_NAME).join(PREFERENCES_FILE_NAME))
        .ok_or_else(|| SlideError::ConfigError("Config directory not found".to_string()))
}

/// Preferences stored as pretty JSON on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the platform configuration directory
    pub fn in_config_dir() -> Result<Self> {
        Ok(Self::new(default_preferences_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferencesStore for JsonFileStore {
    /// Missing, empty or unreadable files yield defaults
    fn load(&self) -> Result<Preferences> {
        if !self.path.exists() {
            debug!(
                "Preferences not found at {}, using defaults",
                self.path.display()
            );
            return Ok(Preferences::default());
        }

        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Preferences::default());
        }

        match serde_json::from_str(&contents) {
            Ok(preferences) => {
                info!("Preferences loaded from {}", self.path.display());
                Ok(preferences)
            }
            Err(e) => {
                warn!(
                    "Preferences at {} contain invalid JSON, using defaults: {}",
                    self.path.display(),
                    e
                );
                Ok(Preferences::default())
            }
        }
    }

    fn save(&self, preferences: &Preferences) -> Result<()> {
        let json = serde_json::to_string_pretty(preferences)?;
        write_atomically(&self.path, json.as_bytes())?;
        info!("Preferences saved to {}", self.path.display());
        Ok(())
    }
}

/// Store that never touches the filesystem
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: RefCell<Option<Preferences>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferencesStore for MemoryStore {
    fn load(&self) -> Result<Preferences> {
        Ok(self.saved.borrow().clone().unwrap_or_default())
    }

    fn save(&self, preferences: &Preferences) -> Result<()> {
        *self.saved.borrow_mut() = Some(preferences.clone());
        Ok(())
    }
}
