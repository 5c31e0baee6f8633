//! Device-control collaborator contract
//!
//! The session layer treats the transport as a black box: it opens one
//! connection at a time through a [`DeviceConnector`] and issues every
//! command and subscription through the returned [`DeviceConnection`].
//!
//! All methods are blocking. Callers that must not block (the GUI loop, the
//! hotkey monitor) run them on a worker thread.

use std::sync::Arc;

use crate::command::DeviceCommand;
use crate::device::Device;
use crate::error::Result;
use crate::event::EventSink;
use crate::source::Source;

/// Opens connections to devices
pub trait DeviceConnector: Send + Sync + 'static {
    fn connect(&self, device: &Device) -> Result<Arc<dyn DeviceConnection>>;
}

/// An open session with one device
pub trait DeviceConnection: Send + Sync + 'static {
    /// The device this connection talks to
    fn device(&self) -> &Device;

    /// Execute one fire-and-forget command
    fn execute(&self, command: &DeviceCommand) -> Result<()>;

    /// Fetch the device's enabled sources, in device order
    fn enabled_sources(&self) -> Result<Vec<Source>>;

    /// Start pushing notifications into `sink`
    ///
    /// Replaces any sink installed by a previous call.
    fn start_notifications(&self, sink: EventSink) -> Result<()>;

    /// Stop pushing notifications
    ///
    /// After this returns the connection must not call the previous sink
    /// again.
    fn stop_notifications(&self);

    /// Release the connection; later commands fail with
    /// [`ControlError::Closed`](crate::ControlError::Closed)
    fn close(&self) {}
}
