//! Shared fixtures for session integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use remote_core::testing::{MockConnection, MockConnector};
use remote_core::{Device, Source, SourceType};
use remote_session::{ConnectionStatus, Session, SessionConfig};

pub const KITCHEN: &str = "192.168.1.20";
pub const LIVING_ROOM: &str = "192.168.1.21";

/// Poll `condition` until it holds or two seconds pass
pub fn wait_until<F: FnMut() -> bool>(mut condition: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

pub fn kitchen() -> Device {
    Device::new("Kitchen", KITCHEN, 8080)
}

pub fn living_room() -> Device {
    Device::new("Living room", LIVING_ROOM, 8080)
}

pub fn kitchen_sources() -> Vec<Source> {
    vec![
        Source::new("spotify:1", "Spotify", SourceType::Spotify),
        Source::new("linein:1", "Line in", SourceType::LineIn),
        Source::new("radio:1", "TuneIn", SourceType::TuneIn),
    ]
}

pub fn living_room_sources() -> Vec<Source> {
    vec![
        Source::new("bluetooth:2", "Bluetooth", SourceType::Bluetooth),
        Source::new("airplay:2", "AirPlay", SourceType::AirPlay),
    ]
}

pub fn connector() -> MockConnector {
    MockConnector::new()
        .with_sources(KITCHEN, kitchen_sources())
        .with_sources(LIVING_ROOM, living_room_sources())
}

pub fn start(config: SessionConfig, connector: &MockConnector) -> Session {
    Session::new(config, Arc::new(connector.clone())).expect("Failed to start session")
}

/// Connect and wait for the connection and its first catalog load
pub fn connect(session: &Session, connector: &MockConnector, device: Device) -> Arc<MockConnection> {
    let host = device.host.clone();
    session.connect(device.clone()).expect("Failed to post connect");

    assert!(
        wait_until(|| session.connection_status() == ConnectionStatus::Connected(device.clone())),
        "Timed out connecting to {}",
        device
    );
    if session.config().sources.enabled {
        assert!(
            wait_until(|| !session.catalog().entries.is_empty()),
            "Timed out loading sources from {}",
            device
        );
    }

    connector.connection(&host).expect("No connection recorded")
}
