use thiserror::Error;

#[derive(Error, Debug)]
pub enum FsError {
    #[error("No such file or directory: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    #[error("Directory is not empty: {0} (use -r to remove recursively)")]
    NotEmpty(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Disk full: {needed} sectors needed, {available} available")]
    DiskFull { needed: u64, available: u64 },

    #[error("Invalid sector number: {0}")]
    InvalidSector(u64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FsError {
    /// True for errors raised by the tree or the sector layer, false for
    /// failures of the outside world (real-filesystem I/O, configuration).
    pub fn is_filesystem_error(&self) -> bool {
        !matches!(
            self,
            FsError::Io(_) | FsError::Config(_) | FsError::ConfigParse(_) | FsError::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FsError>;
