use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("SSH error: {0}")]
    Ssh(String),

    #[error("Remote command failed: {0}")]
    Remote(String),

    #[error("Timeout waiting for {0}")]
    Timeout(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Missing required parameter: {0}")]
    MissingParam(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
