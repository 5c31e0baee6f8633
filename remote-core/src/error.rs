use thiserror::Error;

/// Errors reported by a device connection
///
/// None of these are fatal: the session layer logs them and keeps the
/// display as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The device could not be reached at its address
    #[error("Device unreachable: {0}")]
    Unreachable(String),

    /// The device answered but refused the request
    #[error("Request rejected by device: {0}")]
    Rejected(String),

    /// The device did not answer in time
    #[error("Request timed out")]
    Timeout,

    /// The connection has already been closed
    #[error("Connection closed")]
    Closed,

    /// Anything else the transport reports
    #[error("{0}")]
    Other(String),
}

/// Result type for device control operations
pub type Result<T> = std::result::Result<T, ControlError>;
