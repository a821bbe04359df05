use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioMovieError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Composition error: {0}")]
    Composition(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, AudioMovieError>;

/// Terminal failure of one export attempt, as reported to observers.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ExportFailure {
    message: String,
    #[source]
    cause: Option<AudioMovieError>,
}

impl ExportFailure {
    pub fn new<S: Into<String>>(message: S, cause: Option<AudioMovieError>) -> Self {
        Self {
            message: message.into(),
            cause,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&AudioMovieError> {
        self.cause.as_ref()
    }
}
