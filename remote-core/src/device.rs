//! Device identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// A networked audio endpoint that can be controlled
///
/// Devices are identified by their network address; the friendly name is
/// for display only and two devices with the same address are the same
/// device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Friendly name shown in the device menu, e.g. "Kitchen"
    pub name: String,
    /// Host name or IP address
    pub host: String,
    /// Control port (typically 8080)
    pub port: u16,
}

impl Device {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
        }
    }

    /// `host:port` form of the device address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.port == other.port
    }
}

impl Eq for Device {}

impl std::hash::Hash for Device {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.host.hash(state);
        self.port.hash(state);
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" ({})", self.name, self.address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ignores_name() {
        let a = Device::new("Kitchen", "10.0.0.5", 8080);
        let b = Device::new("Renamed", "10.0.0.5", 8080);
        let c = Device::new("Kitchen", "10.0.0.6", 8080);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display() {
        let device = Device::new("Kitchen", "beoplay-kitchen.local", 8080);
        assert_eq!(device.address(), "beoplay-kitchen.local:8080");
        assert_eq!(device.to_string(), "\"Kitchen\" (beoplay-kitchen.local:8080)");
    }
}
