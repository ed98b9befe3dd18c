//! Account preferences persisted to a small JSON file
//!
//! Holds the login flag and saved account fields the login and profile
//! screens read and write. Reads and writes are synchronous, matching
//! the key-value store this replaces.

use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Locally saved account state
///
/// An absent file means defaults: logged out, nothing saved.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preferences {
    pub logged_in: bool,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// File-backed store for [`Preferences`]
///
/// Writes go to a temp file first and are renamed into place, so an
/// interrupted write never leaves a corrupt file behind.
pub struct PrefsStore {
    path: PathBuf,
}

impl PrefsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the saved preferences, or defaults when the file does not exist
    pub fn load(&self) -> Result<Preferences, StorageError> {
        if !self.path.exists() {
            return Ok(Preferences::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        let prefs = serde_json::from_str(&contents)?;
        Ok(prefs)
    }

    /// Saves the preferences, replacing whatever was stored
    pub fn save(&self, prefs: &Preferences) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents = serde_json::to_string_pretty(prefs)?;
        let tmp = self.path.with_extension("tmp");

        let result = fs::write(&tmp, contents).and_then(|_| fs::rename(&tmp, &self.path));
        if result.is_err() {
            // Clean up partial temp file on any error
            let _ = fs::remove_file(&tmp);
        }

        result.map_err(StorageError::Io)
    }

    /// Whether an account is currently logged in
    pub fn is_logged_in(&self) -> Result<bool, StorageError> {
        Ok(self.load()?.logged_in)
    }

    /// Records a successful login with its account fields
    pub fn log_in(
        &self,
        email: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<(), StorageError> {
        self.save(&Preferences {
            logged_in: true,
            email: Some(email.into()),
            display_name: Some(display_name.into()),
        })
    }

    /// Clears the login flag, keeping the saved account fields
    pub fn log_out(&self) -> Result<(), StorageError> {
        let mut prefs = self.load()?;
        prefs.logged_in = false;
        self.save(&prefs)
    }

    /// Updates the saved display name
    pub fn set_display_name(&self, name: impl Into<String>) -> Result<(), StorageError> {
        let mut prefs = self.load()?;
        prefs.display_name = Some(name.into());
        self.save(&prefs)
    }
}
