//! Client-local state file.
//!
//! Holds what the CLI remembers between runs: API keys for anonymous use,
//! the remembered session token and profile, and a bounded log of recent
//! solves. Stored as pretty JSON at `<config dir>/doubt-solver/local.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Maximum number of entries kept in the local history log.
pub const HISTORY_CAPACITY: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum LocalError {
    #[error("no config directory available on this platform")]
    NoConfigDir,
    #[error("local state io failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("local state file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub filename: String,
    pub subject: String,
    pub provider: String,
    /// Final answer text, when the solution had one.
    #[serde(default)]
    pub answer: Option<String>,
    /// Rendered HTML returned by the server.
    pub solution: String,
    pub time_ms: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalState {
    #[serde(default)]
    pub api_keys: BTreeMap<String, String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<Value>,
    /// Newest first.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// `<config dir>/doubt-solver/local.json`.
///
/// # Errors
///
/// Returns [`LocalError::NoConfigDir`] when the platform has no config dir.
pub fn default_path() -> Result<PathBuf, LocalError> {
    let mut path = dirs::config_dir().ok_or(LocalError::NoConfigDir)?;
    path.push("doubt-solver");
    path.push("local.json");
    Ok(path)
}

impl LocalState {
    /// Load from `path`. A missing file is an empty state.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, LocalError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(LocalError::Io { path: path.to_owned(), source }),
        };
        serde_json::from_str(&raw).map_err(|source| LocalError::Corrupt { path: path.to_owned(), source })
    }

    /// Write to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), LocalError> {
        let io_err = |source| LocalError::Io { path: path.to_owned(), source };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = serde_json::to_string_pretty(self)
            .map_err(|source| LocalError::Corrupt { path: path.to_owned(), source })?;
        fs::write(path, raw).map_err(io_err)
    }

    /// Merge keys. A blank value clears that provider.
    pub fn set_keys<'a>(&mut self, keys: impl IntoIterator<Item = (&'a str, &'a str)>) {
        for (provider, key) in keys {
            let key = key.trim();
            if key.is_empty() {
                self.api_keys.remove(provider);
            } else {
                self.api_keys.insert(provider.to_owned(), key.to_owned());
            }
        }
    }

    /// `apiKeys` form field value.
    #[must_use]
    pub fn api_keys_json(&self) -> String {
        serde_json::to_string(&self.api_keys).unwrap_or_else(|_| "{}".to_owned())
    }

    pub fn remember_session(&mut self, token: &str, user: Value) {
        self.token = Some(token.to_owned());
        self.user = Some(user);
    }

    pub fn forget_session(&mut self) {
        self.token = None;
        self.user = None;
    }

    /// Prepend `entry`, evicting the oldest beyond [`HISTORY_CAPACITY`].
    pub fn push_history(&mut self, entry: HistoryEntry) {
        self.history.insert(0, entry);
        self.history.truncate(HISTORY_CAPACITY);
    }
}

#[cfg(test)]
#[path = "local_test.rs"]
mod tests;
