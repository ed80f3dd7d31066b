mod config;
pub mod database;
pub mod migrations;

pub use config::{CategoryOverride, ChallengeConfig, Config, HistoryConfig, NotificationsConfig};
pub use database::{Database, QueuedUpdate};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};
use crate::session::SessionState;

/// Persistence collaborator for session state.
///
/// The engines never touch storage themselves; callers load a snapshot,
/// run engine operations on it and save what comes back.
pub trait SessionStore {
    fn load(&self) -> Result<SessionState>;
    fn save(&mut self, state: &SessionState) -> Result<()>;
}

/// In-memory store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Option<SessionState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<SessionState> {
        Ok(self.state.clone().unwrap_or_default())
    }

    fn save(&mut self, state: &SessionState) -> Result<()> {
        self.state = Some(state.clone());
        Ok(())
    }
}

/// Returns `~/.config/waterprint[-dev]/` based on WATERPRINT_ENV.
///
/// Set WATERPRINT_ENV=dev to use the development data directory, or
/// WATERPRINT_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("WATERPRINT_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env =
                std::env::var("WATERPRINT_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("waterprint-dev")
            } else {
                base_dir.join("waterprint")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
