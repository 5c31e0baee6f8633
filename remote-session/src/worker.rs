//! Session worker: the single UI-affecting execution context
//!
//! Spawns a thread with its own current-thread tokio runtime. The thread
//! owns every piece of mutable session state and handles one
//! [`SessionMessage`] at a time, so state mutations and notification
//! delivery are serialized without locks on the state itself.
//!
//! Device calls never run on this thread's executor directly: commands go
//! through a per-connection [`CommandQueue`] drained on the blocking pool,
//! and catalog fetches and connection opening run there too.
//!
//! Every connection gets a new generation number. Events, catalog results
//! and timers carry the generation (or token) they were started under, and
//! anything that arrives for an older one is dropped.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::RwLock;
use remote_core::{
    ControlError, Device, DeviceCommand, DeviceConnection, DeviceConnector, DeviceEvent,
    EventKind, EventSink, Source,
};
use tokio::sync::mpsc;

use crate::bus::{EventHandler, NotificationBus, SubscriptionId};
use crate::catalog::{ReloadTicket, SourceCatalog};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::now_playing::PlayerState;
use crate::radio::RadioPresets;
use crate::view::{CatalogView, ConnectionStatus, LinkStatus, SessionView, VolumeView};
use crate::volume::{DebounceToken, VolumeEffect, VolumeSync, MAX_VOLUME};

/// Messages handled by the session worker
pub(crate) enum SessionMessage {
    Connect(Device),
    Disconnect,
    DeviceEvent {
        generation: u64,
        event: DeviceEvent,
    },
    SliderMoved {
        value: u8,
        release: bool,
    },
    SelectSource(String),
    ReloadSources,
    SourcesLoaded {
        generation: u64,
        ticket: ReloadTicket,
        result: Result<Vec<Source>, ControlError>,
    },
    DebounceElapsed(DebounceToken),
    Subscribe {
        id: SubscriptionId,
        kind: EventKind,
        handler: EventHandler,
    },
    Unsubscribe(SubscriptionId),
    Shutdown,
}

/// Ordered command channel to one connection
///
/// Commands run one after another on the blocking pool, in the order they
/// were queued, so `setVolume(25)` can never land after `setVolume(35)`.
#[derive(Clone)]
pub(crate) struct CommandQueue {
    tx: mpsc::UnboundedSender<DeviceCommand>,
}

impl CommandQueue {
    /// Must be called from inside the worker runtime
    fn spawn(connection: Arc<dyn DeviceConnection>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<DeviceCommand>();

        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                let target = Arc::clone(&connection);
                let outcome = tokio::task::spawn_blocking(move || {
                    let result = target.execute(&command);
                    (command, result)
                })
                .await;

                match outcome {
                    Ok((command, Ok(()))) => {
                        tracing::debug!("{} sent to {}", command, connection.device());
                    }
                    Ok((command, Err(e))) => {
                        tracing::warn!("{} to {} failed: {}", command, connection.device(), e);
                    }
                    Err(e) => {
                        tracing::warn!("Command task for {} failed: {}", connection.device(), e);
                    }
                }
            }
            tracing::debug!("Command queue for {} closed", connection.device());
        });

        Self { tx }
    }

    pub(crate) fn send(&self, command: DeviceCommand) -> Result<(), SessionError> {
        self.tx
            .send(command)
            .map_err(|_| SessionError::NoActiveDevice)
    }
}

/// The active connection as seen by command issuers on other threads
#[derive(Clone)]
pub(crate) struct ActiveConnection {
    pub(crate) device: Device,
    pub(crate) commands: CommandQueue,
}

/// State the worker publishes for other threads; the worker is the only
/// writer
pub(crate) struct Shared {
    pub(crate) view: RwLock<SessionView>,
    pub(crate) active: RwLock<Option<ActiveConnection>>,
}

impl Shared {
    pub(crate) fn new(config: &SessionConfig) -> Self {
        Self {
            view: RwLock::new(SessionView::initial(
                &config.title,
                config.tune_in.stations.clone(),
            )),
            active: RwLock::new(None),
        }
    }
}

/// Spawns the session worker thread
///
/// Returns once the worker's runtime is up.
pub(crate) fn spawn_session_worker(
    config: Arc<SessionConfig>,
    radio: Arc<RadioPresets>,
    connector: Arc<dyn DeviceConnector>,
    shared: Arc<Shared>,
    tx: mpsc::UnboundedSender<SessionMessage>,
    rx: mpsc::UnboundedReceiver<SessionMessage>,
) -> Result<JoinHandle<()>, SessionError> {
    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), String>>();

    let worker = thread::Builder::new()
        .name("beoremote-session".to_string())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!("Failed to create tokio runtime for session worker: {}", e);
                    let _ = ready_tx.send(Err(e.to_string()));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(()));

            rt.block_on(async move {
                let core = SessionCore::new(config, radio, connector, shared, tx);
                run_session_loop(core, rx).await;
            });

            // don't hang on a device call that never returns
            rt.shutdown_timeout(Duration::from_secs(1));
        })
        .map_err(|e| SessionError::RuntimeInit(e.to_string()))?;

    match ready_rx.recv() {
        Ok(Ok(())) => Ok(worker),
        Ok(Err(e)) => Err(SessionError::RuntimeInit(e)),
        Err(_) => Err(SessionError::RuntimeInit(
            "session worker exited during startup".to_string(),
        )),
    }
}

async fn run_session_loop(
    mut core: SessionCore,
    mut rx: mpsc::UnboundedReceiver<SessionMessage>,
) {
    tracing::info!("Session worker started");

    while let Some(message) = rx.recv().await {
        let keep_running = core.handle(message).await;
        core.publish_view();
        if !keep_running {
            break;
        }
    }

    // the blocking pool is going away; close on this thread
    if let Some(connection) = core.teardown_connection() {
        connection.close();
    }
    core.status = ConnectionStatus::Disconnected;
    core.publish_view();

    tracing::info!("Session worker shut down");
}

struct SessionCore {
    config: Arc<SessionConfig>,
    connector: Arc<dyn DeviceConnector>,
    shared: Arc<Shared>,
    tx: mpsc::UnboundedSender<SessionMessage>,

    generation: u64,
    connection: Option<Arc<dyn DeviceConnection>>,
    commands: Option<CommandQueue>,
    status: ConnectionStatus,
    link: Option<LinkStatus>,

    bus: NotificationBus,
    volume: VolumeSync,
    debounce: Option<tokio::task::JoinHandle<()>>,
    catalog: SourceCatalog,
    player: PlayerState,
    radio: Arc<RadioPresets>,
}

impl SessionCore {
    fn new(
        config: Arc<SessionConfig>,
        radio: Arc<RadioPresets>,
        connector: Arc<dyn DeviceConnector>,
        shared: Arc<Shared>,
        tx: mpsc::UnboundedSender<SessionMessage>,
    ) -> Self {
        let catalog = SourceCatalog::new(&config.sources.hide_types);

        Self {
            config,
            connector,
            shared,
            tx,
            generation: 0,
            connection: None,
            commands: None,
            status: ConnectionStatus::Disconnected,
            link: None,
            bus: NotificationBus::new(),
            volume: VolumeSync::new(),
            debounce: None,
            catalog,
            player: PlayerState::default(),
            radio,
        }
    }

    /// Returns `false` when the worker should stop
    async fn handle(&mut self, message: SessionMessage) -> bool {
        match message {
            SessionMessage::Connect(device) => self.connect(device).await,
            SessionMessage::Disconnect => self.disconnect(),
            SessionMessage::DeviceEvent { generation, event } => self.deliver(generation, event),
            SessionMessage::SliderMoved { value, release } => {
                for effect in self.volume.local_change(value, release) {
                    self.apply_volume_effect(effect);
                }
            }
            SessionMessage::SelectSource(id) => {
                let command = self.catalog.set_selected(&id);
                self.issue(command);
            }
            SessionMessage::ReloadSources => self.reload_sources(),
            SessionMessage::SourcesLoaded {
                generation,
                ticket,
                result,
            } => self.sources_loaded(generation, ticket, result),
            SessionMessage::DebounceElapsed(token) => {
                if self.volume.debounce_elapsed(token) {
                    self.debounce = None;
                }
            }
            SessionMessage::Subscribe { id, kind, handler } => {
                self.bus.subscribe(id, kind, handler)
            }
            SessionMessage::Unsubscribe(id) => {
                if !self.bus.unsubscribe(id) {
                    tracing::debug!("Unsubscribe of unknown {:?}", id);
                }
            }
            SessionMessage::Shutdown => {
                tracing::info!("Session worker received shutdown");
                return false;
            }
        }
        true
    }

    /// Switch to `device`
    ///
    /// Order matters: the old connection stops notifying and is dropped
    /// before the new one is opened and subscribed, so nothing from the old
    /// device can be attributed to the new one.
    async fn connect(&mut self, device: Device) {
        self.release_connection();
        self.generation += 1;
        let generation = self.generation;

        tracing::info!("connectDevice {}", device);
        self.status = ConnectionStatus::Connecting(device.clone());
        self.publish_view();

        let connection = match self.open(&device).await {
            Ok(connection) => connection,
            Err(e) => {
                tracing::warn!("{}", e);
                self.status = ConnectionStatus::Failed {
                    device,
                    reason: e.to_string(),
                };
                return;
            }
        };

        let tx = self.tx.clone();
        let sink = EventSink::new(move |event| {
            tx.send(SessionMessage::DeviceEvent { generation, event })
                .is_ok()
        });
        if let Err(e) = connection.start_notifications(sink) {
            tracing::warn!("Failed to subscribe to notifications from {}: {}", device, e);
        }

        let commands = CommandQueue::spawn(Arc::clone(&connection));
        *self.shared.active.write() = Some(ActiveConnection {
            device: device.clone(),
            commands: commands.clone(),
        });
        self.commands = Some(commands);
        self.connection = Some(connection);

        tracing::info!("Connected to {}", device);
        self.status = ConnectionStatus::Connected(device);

        if self.config.sources.enabled {
            self.reload_sources();
        }
    }

    async fn open(&self, device: &Device) -> Result<Arc<dyn DeviceConnection>, SessionError> {
        let connector = Arc::clone(&self.connector);
        let target = device.clone();
        let mut task = tokio::task::spawn_blocking(move || connector.connect(&target));

        let outcome = tokio::time::timeout(self.config.connect_timeout, &mut task).await;
        match outcome {
            Ok(Ok(Ok(connection))) => Ok(connection),
            Ok(Ok(Err(source))) => Err(SessionError::Connect {
                device: device.clone(),
                source,
            }),
            Ok(Err(join_error)) => Err(SessionError::Connect {
                device: device.clone(),
                source: ControlError::Other(join_error.to_string()),
            }),
            Err(_) => {
                // the connect may still succeed later; close what it opens
                tokio::spawn(async move {
                    if let Ok(Ok(connection)) = task.await {
                        connection.close();
                    }
                });
                Err(SessionError::ConnectTimeout(device.clone()))
            }
        }
    }

    fn disconnect(&mut self) {
        self.release_connection();
        self.generation += 1;
        self.status = ConnectionStatus::Disconnected;
    }

    fn release_connection(&mut self) {
        if let Some(connection) = self.teardown_connection() {
            tokio::task::spawn_blocking(move || connection.close());
        }
    }

    /// Stop notifications and drop everything that belonged to the current
    /// connection: pending debounce, catalog (including an in-flight reload)
    /// and now-playing state
    ///
    /// Returns the connection, still open, for the caller to close.
    fn teardown_connection(&mut self) -> Option<Arc<dyn DeviceConnection>> {
        let connection = self.connection.take();
        if let Some(connection) = &connection {
            connection.stop_notifications();
            tracing::info!("Disconnecting from {}", connection.device());
        }
        self.commands = None;
        *self.shared.active.write() = None;

        if let Some(effect) = self.volume.reset() {
            self.apply_volume_effect(effect);
        }
        self.cancel_debounce();
        self.catalog.invalidate();
        self.player = PlayerState::default();
        self.link = None;

        connection
    }

    fn deliver(&mut self, generation: u64, event: DeviceEvent) {
        if generation != self.generation || self.connection.is_none() {
            tracing::trace!("Dropping {:?} event from a stale connection", event.kind());
            return;
        }

        match &event {
            DeviceEvent::VolumeChange { level } => {
                if *level > MAX_VOLUME {
                    tracing::warn!("Ignoring out-of-range volume {}", level);
                    return;
                }
                self.volume.remote_change(*level);
            }
            DeviceEvent::SourceChange(source) => {
                self.catalog.on_source_change(source);
                self.player.on_source_change(source);
            }
            DeviceEvent::Progress { state, .. } => self.player.on_progress(*state),
            DeviceEvent::ConnectionChange { state, message } => {
                tracing::info!("Connection state {:?}: {}", state, message);
                self.link = Some(LinkStatus {
                    state: *state,
                    message: message.clone(),
                });
            }
            DeviceEvent::NowPlayingRadio {
                name,
                live_description,
            } => self.player.on_radio(name, live_description),
            DeviceEvent::NowPlayingStoredMusic { name, artist } => {
                self.player.on_stored_music(name, artist)
            }
        }

        // subscribers reading the view from a handler see this event applied
        self.publish_view();
        self.bus.publish(&event);
    }

    fn apply_volume_effect(&mut self, effect: VolumeEffect) {
        match effect {
            VolumeEffect::Send(level) => self.issue(DeviceCommand::SetVolume(level)),
            VolumeEffect::ArmDebounce(token) => self.arm_debounce(token),
            VolumeEffect::CancelDebounce => self.cancel_debounce(),
        }
    }

    fn issue(&self, command: DeviceCommand) {
        let result = match &self.commands {
            Some(commands) => commands.send(command.clone()),
            None => Err(SessionError::NoActiveDevice),
        };
        if let Err(e) = result {
            tracing::warn!("Cannot send {}: {}", command, e);
        }
    }

    fn arm_debounce(&mut self, token: DebounceToken) {
        self.cancel_debounce();
        let tx = self.tx.clone();
        let delay = self.config.debounce;
        self.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(SessionMessage::DebounceElapsed(token));
        }));
    }

    fn cancel_debounce(&mut self) {
        if let Some(timer) = self.debounce.take() {
            timer.abort();
        }
    }

    fn reload_sources(&mut self) {
        let Some(connection) = self.connection.clone() else {
            tracing::debug!("No active device, not reloading sources");
            return;
        };

        tracing::debug!("reload sources");
        let ticket = self.catalog.begin_reload();
        let generation = self.generation;
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || connection.enabled_sources())
                .await
                .unwrap_or_else(|e| Err(ControlError::Other(e.to_string())));
            let _ = tx.send(SessionMessage::SourcesLoaded {
                generation,
                ticket,
                result,
            });
        });
    }

    fn sources_loaded(
        &mut self,
        generation: u64,
        ticket: ReloadTicket,
        result: Result<Vec<Source>, ControlError>,
    ) {
        if generation != self.generation {
            tracing::debug!("Discarding sources loaded for a previous connection");
            return;
        }

        match result {
            Ok(sources) => {
                self.catalog.apply_reload(ticket, sources);
            }
            Err(e) => tracing::warn!("Failed to load sources: {}", e),
        }
    }

    fn publish_view(&self) {
        let view = SessionView {
            title: self.config.title.clone(),
            status: self.status.clone(),
            link: self.link.clone(),
            volume: VolumeView {
                level: self.volume.level(),
                suppressed: self.volume.is_suppressed(),
            },
            catalog: CatalogView {
                entries: self.catalog.entries().to_vec(),
                current_source_id: self.catalog.current_source_id().map(str::to_string),
                visible: self.catalog.is_visible(),
            },
            now_playing: self.player.now_playing.clone(),
            playing: self.player.is_playing(),
            controls_enabled: self.player.controls_enabled,
            radio_presets: self.radio.stations().to_vec(),
            radio_visible: self.radio.is_visible(self.catalog.has_tune_in()),
        };

        *self.shared.view.write() = view;
    }
}
