use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Connection failed: {0}")]
    Connection(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
