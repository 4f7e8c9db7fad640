// Error types shared by the board model, the session and persistence

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    /// Board dimensions or mine count outside the accepted range
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("coordinates ({x}, {y}) are outside the board")]
    InvalidCoords { x: usize, y: usize },
    /// Save file could not be opened, read or written
    #[error("cannot access {}: {source}", .path.display())]
    PersistenceIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Only a game in progress can be saved
    #[error("no game in progress to save")]
    NoGameInProgress,
    /// Save file contents are malformed or describe an impossible game
    #[error("bad save data: {0}")]
    Deserialization(String),
}

impl SweepError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SweepError::PersistenceIo {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;
