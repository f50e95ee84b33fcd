use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("College not found: {0}")]
    CollegeNotFound(uuid::Uuid),

    #[error("File not found: {filename} (college {college})")]
    FileNotFound { college: String, filename: String },

    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Export error: {0}")]
    Export(#[from] csv::Error),
}

impl Error {
    /// True for lookups that missed, as opposed to storage failures.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::CollegeNotFound(_) | Self::FileNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
