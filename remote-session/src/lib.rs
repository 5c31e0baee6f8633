//! # Beoplay Remote Session
//!
//! Session coordination for the Beoplay menu-bar remote.
//!
//! A [`Session`] keeps track of one active device and serializes everything
//! that touches the state the UI shows: inbound device notifications,
//! volume slider moves, hotkeys and source selection all go through a single
//! worker thread, so the view never sees a half-applied update and
//! notifications from a device the user already switched away from are
//! never applied.
//!
//! ## Components
//!
//! - [`NotificationBus`]: typed fan-out of device events to handlers
//! - [`VolumeSync`]: slider/device volume reconciliation with drag suppression
//! - [`HotkeyDispatcher`]: global key codes to remote commands
//! - [`SourceCatalog`]: filtered, selectable list of device sources
//! - [`Session`] / [`SessionHandle`]: connection lifecycle and the facade
//!   tying the above together
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use remote_core::{Device, EventKind};
//! use remote_session::{init_logging_from_env, Session, SessionConfig};
//!
//! init_logging_from_env()?;
//!
//! let session = Session::new(SessionConfig::load_or_default(), Arc::new(connector))?;
//! session.connect(Device::new("Living room", "192.168.1.20", 8080))?;
//!
//! let view = session.view();
//! println!("{} at volume {}", view.now_playing.title, view.volume.level);
//! ```

pub mod bus;
pub mod catalog;
pub mod config;
pub mod error;
pub mod hotkeys;
pub mod logging;
pub mod now_playing;
pub mod radio;
pub mod session;
pub mod view;
pub mod volume;

mod worker;

pub use bus::{EventHandler, HandlerError, NotificationBus, SubscriptionId};
pub use catalog::{CatalogEntry, ReloadTicket, SourceCatalog};
pub use config::{ConfigError, HotkeyConfig, SessionConfig, SourcesConfig, TuneInConfig};
pub use error::{Result, SessionError};
pub use hotkeys::{
    AccessibilityPermission, Command, CommandSink, DispatcherState, HotkeyBindings,
    HotkeyDispatcher, HotkeyError, PermissionGate,
};
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use now_playing::{NowPlaying, PlayerState};
pub use radio::{RadioPreset, RadioPresets};
pub use session::{Session, SessionHandle};
pub use view::{CatalogView, ConnectionStatus, LinkStatus, SessionView, VolumeView};
pub use volume::{DebounceToken, VolumeEffect, VolumePhase, VolumeSync, MAX_VOLUME};
