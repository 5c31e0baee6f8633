//! Sync facade over the session worker
//!
//! [`Session`] owns the worker thread. [`SessionHandle`] is the cheap,
//! cloneable side that UI code, hotkey monitors and tests hold: every call
//! either reads the last published [`SessionView`] or posts a message to the
//! worker and returns immediately. Nothing here blocks on the device.

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use remote_core::{Device, DeviceCommand, DeviceConnector, DeviceEvent, EventKind};
use tokio::sync::mpsc;

use crate::bus::{HandlerError, SubscriptionId};
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::hotkeys::{Command, CommandSink, HotkeyDispatcher, PermissionGate};
use crate::radio::RadioPresets;
use crate::view::{CatalogView, ConnectionStatus, SessionView};
use crate::worker::{spawn_session_worker, CommandQueue, SessionMessage, Shared};

/// A running remote-control session
///
/// Dereferences to [`SessionHandle`], so every operation is available
/// directly on the session.
///
/// # Example
///
/// ```rust,ignore
/// use remote_core::{Device, EventKind};
/// use remote_session::{Session, SessionConfig};
///
/// let session = Session::new(SessionConfig::load_or_default(), connector)?;
///
/// session.subscribe(EventKind::VolumeChange, |event| {
///     println!("{:?}", event);
///     Ok(())
/// })?;
///
/// session.connect(Device::new("Kitchen", "beoplay-kitchen.local", 8080))?;
/// session.user_moved_slider(35, true)?;
///
/// session.shutdown();
/// ```
pub struct Session {
    handle: SessionHandle,
    worker: Option<JoinHandle<()>>,
}

impl Session {
    /// Start the session worker
    ///
    /// No device is connected yet; call [`SessionHandle::connect`].
    pub fn new(config: SessionConfig, connector: Arc<dyn DeviceConnector>) -> Result<Self> {
        tracing::info!("Starting session {:?}", config.title);

        let config = Arc::new(config);
        let radio = Arc::new(RadioPresets::new(
            config.tune_in.enabled,
            config.tune_in.stations.clone(),
        ));
        let shared = Arc::new(Shared::new(&config));
        let (tx, rx) = mpsc::unbounded_channel();

        let worker = spawn_session_worker(
            Arc::clone(&config),
            Arc::clone(&radio),
            connector,
            Arc::clone(&shared),
            tx.clone(),
            rx,
        )?;

        Ok(Self {
            handle: SessionHandle {
                tx,
                shared,
                config,
                radio,
                hotkey_gate: PermissionGate::new(),
                next_subscription: Arc::new(AtomicU64::new(1)),
            },
            worker: Some(worker),
        })
    }

    /// A cloneable handle for other threads
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Disconnect, stop the worker and wait for it to finish
    pub fn shutdown(mut self) {
        self.stop_worker(true);
    }

    fn stop_worker(&mut self, wait: bool) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        if self.handle.tx.send(SessionMessage::Shutdown).is_err() {
            tracing::debug!("Session worker already stopped");
        }

        if wait && worker.join().is_err() {
            tracing::error!("Session worker panicked");
        }
    }
}

impl Deref for Session {
    type Target = SessionHandle;

    fn deref(&self) -> &SessionHandle {
        &self.handle
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // don't join here; a drop on the worker thread itself would deadlock
        self.stop_worker(false);
    }
}

/// Cloneable access to a running [`Session`]
///
/// Once the session has shut down, operations that need the worker fail
/// with [`SessionError::WorkerDisconnected`].
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionMessage>,
    shared: Arc<Shared>,
    config: Arc<SessionConfig>,
    radio: Arc<RadioPresets>,
    hotkey_gate: PermissionGate,
    next_subscription: Arc<AtomicU64>,
}

impl SessionHandle {
    fn post(&self, message: SessionMessage) -> Result<()> {
        self.tx
            .send(message)
            .map_err(|_| SessionError::WorkerDisconnected)
    }

    fn active_commands(&self) -> Result<CommandQueue> {
        self.shared
            .active
            .read()
            .as_ref()
            .map(|active| active.commands.clone())
            .ok_or(SessionError::NoActiveDevice)
    }

    // Connection

    /// Make `device` the active device
    ///
    /// Any current connection is torn down first. The outcome shows up in
    /// [`SessionHandle::connection_status`].
    pub fn connect(&self, device: Device) -> Result<()> {
        self.post(SessionMessage::Connect(device))
    }

    pub fn disconnect(&self) -> Result<()> {
        self.post(SessionMessage::Disconnect)
    }

    pub fn current_device(&self) -> Option<Device> {
        self.shared
            .active
            .read()
            .as_ref()
            .map(|active| active.device.clone())
    }

    // User actions

    /// The volume slider moved to `value`
    ///
    /// `is_final_release` is true for the event that ends a drag (or a
    /// single click).
    ///
    /// `NoActiveDevice` reflects the connection at call time. A disconnect
    /// that lands before the worker handles the move drops the resulting
    /// command with a warning instead.
    pub fn user_moved_slider(&self, value: u8, is_final_release: bool) -> Result<()> {
        self.active_commands()?;
        self.post(SessionMessage::SliderMoved {
            value,
            release: is_final_release,
        })
    }

    pub fn user_selected_source(&self, id: impl Into<String>) -> Result<()> {
        self.active_commands()?;
        self.post(SessionMessage::SelectSource(id.into()))
    }

    /// Handle a hotkey command
    ///
    /// Commands the remote has no device action for are logged and ignored.
    pub fn user_pressed(&self, command: Command) -> Result<()> {
        match command.device_command(self.config.hotkeys.volume_step) {
            Some(device_command) => self.send_command(device_command),
            None => {
                tracing::info!("{}: not implemented", command);
                Ok(())
            }
        }
    }

    /// Queue `command` for the active device
    ///
    /// Returns once the command is queued. Failures on the device side are
    /// logged, not returned.
    pub fn send_command(&self, command: DeviceCommand) -> Result<()> {
        let commands = self.active_commands()?;
        tracing::debug!("{}", command);
        commands.send(command)
    }

    /// Play the configured radio preset `preset_id`
    pub fn tune_in(&self, preset_id: &str) -> Result<()> {
        let preset = self
            .radio
            .find(preset_id)
            .ok_or_else(|| SessionError::UnknownPreset(preset_id.to_string()))?;

        self.send_command(DeviceCommand::TuneIn {
            id: preset.id.clone(),
            name: preset.name.clone(),
        })
    }

    /// Fetch the device's source list again
    ///
    /// Without an active device this is a no-op.
    pub fn reload_sources(&self) -> Result<()> {
        self.post(SessionMessage::ReloadSources)
    }

    // Subscriptions

    /// Register `handler` for device events of `kind`
    ///
    /// Handlers run on the session worker, one event at a time, in delivery
    /// order. An error or panic from a handler is logged and does not stop
    /// delivery to other handlers.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Result<SubscriptionId>
    where
        F: FnMut(&DeviceEvent) -> std::result::Result<(), HandlerError> + Send + 'static,
    {
        let id = SubscriptionId::new(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.post(SessionMessage::Subscribe {
            id,
            kind,
            handler: Box::new(handler),
        })?;
        Ok(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        self.post(SessionMessage::Unsubscribe(id))
    }

    // Reads

    /// Last published snapshot
    pub fn view(&self) -> SessionView {
        self.shared.view.read().clone()
    }

    pub fn volume_level(&self) -> u8 {
        self.shared.view.read().volume.level
    }

    pub fn catalog(&self) -> CatalogView {
        self.shared.view.read().catalog.clone()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.shared.view.read().status.clone()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Dispatcher bound to this session, or `None` when hotkeys are
    /// disabled in the configuration
    ///
    /// The dispatcher starts disabled; the platform layer enables it once
    /// accessibility permission is known. All dispatchers of a session share
    /// the permission outcome: after one is denied, every later one starts
    /// out denied.
    pub fn hotkey_dispatcher(&self) -> Option<HotkeyDispatcher<SessionHandle>> {
        let hotkeys = &self.config.hotkeys;
        if !hotkeys.enabled {
            tracing::info!("Hotkeys disabled by configuration");
            return None;
        }

        tracing::info!("hotkeys.VolumeStep: {}", hotkeys.volume_step);
        let mut dispatcher = HotkeyDispatcher::with_gate(self.clone(), self.hotkey_gate.clone());
        dispatcher.register(hotkeys.bindings());
        for command in Command::ALL {
            if let Some(key_code) = dispatcher.bindings().key_code_for(command) {
                tracing::debug!("hotkeys.{}: {}", command, key_code);
            }
        }
        Some(dispatcher)
    }
}

impl CommandSink for SessionHandle {
    fn dispatch(&self, command: Command) {
        if let Err(e) = self.user_pressed(command) {
            tracing::warn!("Hotkey {} dropped: {}", command, e);
        }
    }
}
