use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConeError>;

#[derive(Debug, Error)]
pub enum ConeError {
    #[error("Frame {frame} is out of range. Max frame index: {max}", max = .n_frames.saturating_sub(1))]
    FrameOutOfRange { frame: usize, n_frames: usize },

    #[error("Cannot compute geometry of an empty point set")]
    EmptyPointSet,

    #[error("Tip ResID {0} not found in trajectory")]
    MissingTip(i32),

    #[error("Failed to parse {path}: {message}", path = path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Atom count mismatch: topology has {topology} atoms, trajectory has {trajectory}")]
    AtomCountMismatch { topology: usize, trajectory: usize },

    #[error("Unsupported trajectory format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ConeError {
    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ConeError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}
