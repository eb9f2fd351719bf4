use thiserror::Error;

/// Errors surfaced by bridge implementations.
///
/// Remote storage failures are split so callers can tell an unreachable or
/// rejected session (`Transport`) apart from a path that simply is not there
/// (`NotFound`).
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Remote storage unavailable: {0}")]
    Transport(String),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Path already exists: {0}")]
    AlreadyExists(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the error means the storage itself could not be reached.
    pub fn is_transport(&self) -> bool {
        matches!(self, BridgeError::Transport(_))
    }

    /// Whether the error means the addressed path does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            BridgeError::NotFound(_) => true,
            BridgeError::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
