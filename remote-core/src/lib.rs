//! # Beoplay Remote Core
//!
//! Typed model and control contract for a networked Beoplay speaker.
//!
//! This crate describes *what* the session layer can ask of a device and
//! *what* a device reports back, without committing to a transport. The
//! discovery mechanism and the wire protocol live behind the
//! [`DeviceConnector`] and [`DeviceConnection`] traits.
//!
//! ## Overview
//!
//! - [`Device`]: identity of an endpoint on the network
//! - [`Source`] / [`SourceType`]: entries of the device's source catalog
//! - [`DeviceEvent`] / [`EventKind`]: the closed set of inbound notifications
//! - [`DeviceCommand`]: the closed set of fire-and-forget commands
//! - [`EventSink`]: where a connection pushes its inbound notifications
//!
//! ## Usage
//!
//! ```rust,ignore
//! use remote_core::{Device, DeviceCommand, DeviceConnector, EventSink};
//!
//! let device = Device::new("Kitchen", "beoplay-kitchen.local", 8080);
//! let connection = connector.connect(&device)?;
//!
//! connection.start_notifications(EventSink::new(|event| {
//!     println!("{:?}", event);
//!     true
//! }))?;
//!
//! connection.execute(&DeviceCommand::SetVolume(30))?;
//! ```

pub mod command;
pub mod connection;
pub mod device;
pub mod error;
pub mod event;
pub mod source;

#[cfg(feature = "test-support")]
pub mod testing;

pub use command::DeviceCommand;
pub use connection::{DeviceConnection, DeviceConnector};
pub use device::Device;
pub use error::{ControlError, Result};
pub use event::{DeviceEvent, EventKind, EventSink, LinkState, PlaybackState};
pub use source::{Source, SourceType};
