//! Configured radio presets

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RadioPreset {
    /// Station id understood by `tuneIn`, e.g. "s24861"
    pub id: String,
    pub name: String,
}

impl RadioPreset {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Ordered preset list, shown only when the device can play radio
#[derive(Debug, Clone, Default)]
pub struct RadioPresets {
    enabled: bool,
    stations: Vec<RadioPreset>,
}

impl RadioPresets {
    pub fn new(enabled: bool, stations: Vec<RadioPreset>) -> Self {
        for station in &stations {
            tracing::debug!("tuneIn radio station id: {}, station name: {}", station.id, station.name);
        }
        Self { enabled, stations }
    }

    pub fn stations(&self) -> &[RadioPreset] {
        &self.stations
    }

    pub fn find(&self, id: &str) -> Option<&RadioPreset> {
        self.stations.iter().find(|s| s.id == id)
    }

    /// Presets are shown when enabled and the current device has a TuneIn
    /// source
    pub fn is_visible(&self, device_has_tune_in: bool) -> bool {
        self.enabled && device_has_tune_in
    }
}
