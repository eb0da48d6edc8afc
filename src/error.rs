use std::path::PathBuf;

use thiserror::Error;

/// Failures of the output collaborators (overlay assets, media player, voice).
///
/// These never reach the tick loop; the dispatching sink logs them.
#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("overlay asset not found: {0}")]
    AssetMissing(PathBuf),

    #[error("media controller at {addr} unreachable: {source}")]
    MediaUnreachable {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type FeedbackResult<T> = std::result::Result<T, FeedbackError>;
