//! In-memory connector for tests
//!
//! [`MockConnector`] hands out [`MockConnection`]s that record every command,
//! serve a configurable source list and let a test push notifications as if
//! they came from the device.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::command::DeviceCommand;
use crate::connection::{DeviceConnection, DeviceConnector};
use crate::device::Device;
use crate::error::{ControlError, Result};
use crate::event::{DeviceEvent, EventSink};
use crate::source::Source;

#[derive(Default)]
struct ConnectorState {
    sources: HashMap<String, Vec<Source>>,
    unreachable: HashSet<String>,
    connect_delay: Option<Duration>,
    connections: Vec<Arc<MockConnection>>,
}

/// Scriptable connector keyed by device host
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<ConnectorState>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `sources` from every connection to `host`
    pub fn with_sources(self, host: &str, sources: Vec<Source>) -> Self {
        self.state.lock().sources.insert(host.to_string(), sources);
        self
    }

    /// Make connections to `host` fail
    pub fn unreachable(self, host: &str) -> Self {
        self.state.lock().unreachable.insert(host.to_string());
        self
    }

    /// Delay every `connect` call
    pub fn with_connect_delay(self, delay: Duration) -> Self {
        self.state.lock().connect_delay = Some(delay);
        self
    }

    /// Replace the sources served to `host` (affects open connections too)
    pub fn set_sources(&self, host: &str, sources: Vec<Source>) {
        let mut state = self.state.lock();
        state.sources.insert(host.to_string(), sources.clone());
        for connection in state.connections.iter().filter(|c| c.device.host == host) {
            *connection.sources.lock() = sources.clone();
        }
    }

    /// Most recent connection opened to `host`
    pub fn connection(&self, host: &str) -> Option<Arc<MockConnection>> {
        self.state
            .lock()
            .connections
            .iter()
            .rev()
            .find(|c| c.device.host == host)
            .cloned()
    }

    /// Every connection opened so far, oldest first
    pub fn connections(&self) -> Vec<Arc<MockConnection>> {
        self.state.lock().connections.clone()
    }
}

impl DeviceConnector for MockConnector {
    fn connect(&self, device: &Device) -> Result<Arc<dyn DeviceConnection>> {
        let (delay, unreachable, sources) = {
            let state = self.state.lock();
            (
                state.connect_delay,
                state.unreachable.contains(&device.host),
                state.sources.get(&device.host).cloned().unwrap_or_default(),
            )
        };

        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }

        if unreachable {
            return Err(ControlError::Unreachable(device.address()));
        }

        let connection = Arc::new(MockConnection::new(device.clone(), sources));
        self.state.lock().connections.push(Arc::clone(&connection));
        Ok(connection)
    }
}

/// A recorded connection to one device
pub struct MockConnection {
    device: Device,
    sources: Mutex<Vec<Source>>,
    source_delay: Mutex<Option<Duration>>,
    commands: Mutex<Vec<DeviceCommand>>,
    sink: Mutex<Option<EventSink>>,
    last_sink: Mutex<Option<EventSink>>,
    fail_commands: AtomicBool,
    closed: AtomicBool,
}

impl MockConnection {
    fn new(device: Device, sources: Vec<Source>) -> Self {
        Self {
            device,
            sources: Mutex::new(sources),
            source_delay: Mutex::new(None),
            commands: Mutex::new(Vec::new()),
            sink: Mutex::new(None),
            last_sink: Mutex::new(None),
            fail_commands: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    /// Commands executed on this connection, in execution order
    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.commands.lock().clone()
    }

    /// Push an event through the currently installed sink
    ///
    /// Returns `false` if notifications are stopped.
    pub fn emit(&self, event: DeviceEvent) -> bool {
        let sink = self.sink.lock().clone();
        match sink {
            Some(sink) => sink.emit(event),
            None => false,
        }
    }

    /// Push an event through the last sink ever installed, even after
    /// `stop_notifications`, like a transport whose feed is still draining
    pub fn emit_late(&self, event: DeviceEvent) -> bool {
        let sink = self.last_sink.lock().clone();
        match sink {
            Some(sink) => sink.emit(event),
            None => false,
        }
    }

    /// Delay each `enabled_sources` call
    pub fn set_source_delay(&self, delay: Option<Duration>) {
        *self.source_delay.lock() = delay;
    }

    pub fn set_sources(&self, sources: Vec<Source>) {
        *self.sources.lock() = sources;
    }

    /// Make every following command fail
    pub fn fail_commands(&self, fail: bool) {
        self.fail_commands.store(fail, Ordering::SeqCst);
    }

    pub fn is_subscribed(&self) -> bool {
        self.sink.lock().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl DeviceConnection for MockConnection {
    fn device(&self) -> &Device {
        &self.device
    }

    fn execute(&self, command: &DeviceCommand) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ControlError::Closed);
        }
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(ControlError::Rejected(command.to_string()));
        }
        self.commands.lock().push(command.clone());
        Ok(())
    }

    fn enabled_sources(&self) -> Result<Vec<Source>> {
        let delay = *self.source_delay.lock();
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(ControlError::Closed);
        }
        Ok(self.sources.lock().clone())
    }

    fn start_notifications(&self, sink: EventSink) -> Result<()> {
        *self.last_sink.lock() = Some(sink.clone());
        *self.sink.lock() = Some(sink);
        Ok(())
    }

    fn stop_notifications(&self) {
        self.sink.lock().take();
    }

    fn close(&self) {
        self.sink.lock().take();
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_records_commands() {
        let connector = MockConnector::new();
        let connection = connector.connect(&Device::new("A", "a", 8080)).unwrap();

        connection.execute(&DeviceCommand::Play).unwrap();
        connection.execute(&DeviceCommand::SetVolume(10)).unwrap();

        let mock = connector.connection("a").unwrap();
        assert_eq!(
            mock.commands(),
            vec![DeviceCommand::Play, DeviceCommand::SetVolume(10)]
        );
    }

    #[test]
    fn test_unreachable() {
        let connector = MockConnector::new().unreachable("a");
        assert!(matches!(
            connector.connect(&Device::new("A", "a", 8080)),
            Err(ControlError::Unreachable(_))
        ));
    }

    #[test]
    fn test_stop_notifications_detaches_sink() {
        let connector = MockConnector::new();
        let connection = connector.connect(&Device::new("A", "a", 8080)).unwrap();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);

        connection
            .start_notifications(EventSink::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            }))
            .unwrap();

        let mock = connector.connection("a").unwrap();
        assert!(mock.emit(DeviceEvent::VolumeChange { level: 1 }));

        connection.stop_notifications();
        assert!(!mock.emit(DeviceEvent::VolumeChange { level: 2 }));
        assert!(mock.emit_late(DeviceEvent::VolumeChange { level: 3 }));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_closed_connection_rejects_commands() {
        let connector = MockConnector::new();
        let connection = connector.connect(&Device::new("A", "a", 8080)).unwrap();
        connection.close();
        assert_eq!(
            connection.execute(&DeviceCommand::Play),
            Err(ControlError::Closed)
        );
    }
}
