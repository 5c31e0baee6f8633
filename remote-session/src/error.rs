use remote_core::{ControlError, Device};
use thiserror::Error;

/// Errors returned by the session facade
///
/// Nothing here is fatal to the process. Device command failures are not in
/// this list at all: they happen on a worker thread after the call returned
/// and are only logged.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A command was issued while no device is connected
    #[error("No active device")]
    NoActiveDevice,

    /// Opening the connection failed
    #[error("Failed to connect to {device}: {source}")]
    Connect {
        device: Device,
        #[source]
        source: ControlError,
    },

    /// Opening the connection did not finish in time
    #[error("Timed out connecting to {0}")]
    ConnectTimeout(Device),

    /// The session worker is gone (after shutdown)
    #[error("Session worker has shut down")]
    WorkerDisconnected,

    /// The session worker could not be started
    #[error("Failed to start session worker: {0}")]
    RuntimeInit(String),

    /// No radio preset with this id is configured
    #[error("Unknown radio preset: {0}")]
    UnknownPreset(String),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
