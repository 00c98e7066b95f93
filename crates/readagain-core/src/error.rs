use thiserror::Error;

/// All errors that can occur in readagain-core.
#[derive(Debug, Error)]
pub enum ReadAgainError {
    #[error("Child not found: {0}")]
    ChildNotFound(String),

    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl ReadAgainError {
    /// Process exit code the CLI should use for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::ChildNotFound(_) | Self::BookNotFound(_) => ExitCode::NotFound,
            Self::InvalidArgument(_) => ExitCode::InvalidArgs,
            Self::Io(_) => ExitCode::FileSystemError,
            _ => ExitCode::GeneralError,
        }
    }
}

/// Exit codes used by the `readagain` binary.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    NotFound = 2,
    InvalidArgs = 3,
    FileSystemError = 4,
    NetworkError = 6,
}

pub type Result<T> = std::result::Result<T, ReadAgainError>;
