use thiserror::Error;

/// Image build client error types
#[derive(Error, Debug)]
pub enum BuildError {
    /// No spec location (or raw build directory) was given
    #[error("no spec given")]
    MissingSpec,

    /// Image name was empty
    #[error("image name is required")]
    MissingName,

    /// Spec bytes could not be read from disk or fetched remotely
    #[error("Failed to load spec from {location}: {message}")]
    SpecLoad { location: String, message: String },

    /// Spec bytes were not a valid multi-stage build definition
    #[error("Failed to parse spec: {0}")]
    SpecParse(String),

    /// Raw build directory could not be packed
    #[error("Failed to archive {path}: {message}")]
    ArchiveCreation { path: String, message: String },

    /// Connection or stream failure talking to the build service
    #[error("Transport error: {0}")]
    Transport(String),

    /// Build reported as failed by the server
    #[error("Build failed: {message}")]
    BuildFailed { message: String, code: i64 },

    /// Writing to the output device failed
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dispatcher used outside its allowed state transitions
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl BuildError {
    /// Process exit status for this error.
    ///
    /// Server-reported failures keep their own code when it is usable;
    /// everything else exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::BuildFailed { code, .. } => match i32::try_from(*code) {
                Ok(0) | Err(_) => 1,
                Ok(code) => code,
            },
            _ => 1,
        }
    }
}

impl From<serde_yaml::Error> for BuildError {
    fn from(err: serde_yaml::Error) -> Self {
        BuildError::SpecParse(err.to_string())
    }
}

impl From<tonic::Status> for BuildError {
    fn from(status: tonic::Status) -> Self {
        BuildError::Transport(format!("{:?}: {}", status.code(), status.message()))
    }
}

impl From<tonic::transport::Error> for BuildError {
    fn from(err: tonic::transport::Error) -> Self {
        BuildError::Transport(err.to_string())
    }
}

/// Result type alias for image build operations
pub type Result<T> = std::result::Result<T, BuildError>;
