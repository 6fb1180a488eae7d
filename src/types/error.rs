use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistrarError {
    #[error("Coordination error: {0}")]
    Coordination(String),

    #[error("Node does not exist: {0}")]
    NoNode(String),

    #[error("Node already exists: {0}")]
    NodeExists(String),

    #[error("Node has children: {0}")]
    NotEmpty(String),

    #[error("Version mismatch for {0}")]
    BadVersion(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, RegistrarError>;

impl From<serde_json::Error> for RegistrarError {
    fn from(e: serde_json::Error) -> Self {
        RegistrarError::Serialization(e.to_string())
    }
}
