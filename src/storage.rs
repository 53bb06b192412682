//! High score persistence.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("High score file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("High score file is malformed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Holds the single persisted high score.
pub trait HighScoreStore {
    fn load(&self) -> Result<u32, StorageError>;
    fn save(&mut self, high_score: u32) -> Result<(), StorageError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct HighScoreFile {
    high_score: u32,
}

/// JSON file on disk. A file that doesn't exist yet reads as 0.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for FileStore {
    fn load(&self) -> Result<u32, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No high score file at {}", self.path.display());
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };
        let file: HighScoreFile = serde_json::from_str(&text)?;
        Ok(file.high_score)
    }

    fn save(&mut self, high_score: u32) -> Result<(), StorageError> {
        let text = serde_json::to_string_pretty(&HighScoreFile { high_score })?;
        fs::write(&self.path, text)?;
        debug!("Saved high score {} to {}", high_score, self.path.display());
        Ok(())
    }
}
