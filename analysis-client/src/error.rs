use thiserror::Error;

/// Failures anywhere between picking a photo and rendering its findings.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Could not process image: {0}")]
    Decode(String),

    #[error("{0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("An analysis is already in progress")]
    AnalysisInProgress,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Could not access the camera: {0}")]
    Unavailable(String),

    #[error("Camera access was denied. Please grant permission to use the camera.")]
    PermissionDenied,

    #[error("Camera capture failed: {0}")]
    CaptureFailed(String),

    #[error("Camera is not streaming")]
    NotStreaming,
}

impl ClientError {
    /// Single line shown to the user when an analysis attempt fails.
    pub fn user_message(&self) -> String {
        format!("Failed to analyze image: {}", self)
    }
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

impl From<image::ImageError> for ClientError {
    fn from(err: image::ImageError) -> Self {
        ClientError::Decode(err.to_string())
    }
}
