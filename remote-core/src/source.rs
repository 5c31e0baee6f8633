//! Source catalog entries

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of input a source provides
///
/// The device reports types as free-form upper-case strings. The common ones
/// get their own variant; anything else is preserved verbatim in
/// [`SourceType::Other`] so it can still be matched against configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceType {
    TuneIn,
    LineIn,
    Bluetooth,
    Spotify,
    Deezer,
    AirPlay,
    Chromecast,
    Other(String),
}

impl SourceType {
    /// Parse a device-reported type string (case-insensitive)
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "TUNEIN" => SourceType::TuneIn,
            "LINE IN" => SourceType::LineIn,
            "BLUETOOTH" => SourceType::Bluetooth,
            "SPOTIFY" => SourceType::Spotify,
            "DEEZER" => SourceType::Deezer,
            "AIRPLAY" => SourceType::AirPlay,
            "CHROMECAST" => SourceType::Chromecast,
            _ => {
                tracing::trace!("Unrecognized source type {:?}", raw);
                SourceType::Other(raw.trim().to_string())
            }
        }
    }

    /// The type string as the device spells it
    pub fn as_str(&self) -> &str {
        match self {
            SourceType::TuneIn => "TUNEIN",
            SourceType::LineIn => "LINE IN",
            SourceType::Bluetooth => "BLUETOOTH",
            SourceType::Spotify => "SPOTIFY",
            SourceType::Deezer => "DEEZER",
            SourceType::AirPlay => "AIRPLAY",
            SourceType::Chromecast => "CHROMECAST",
            SourceType::Other(raw) => raw,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SourceType {
    fn from(raw: &str) -> Self {
        SourceType::parse(raw)
    }
}

/// A selectable audio input exposed by a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Device-scoped identifier, e.g. "spotify:2714.1200298.28240862@products.bang-olufsen.com"
    pub id: String,
    /// Name of the source itself, e.g. "Spotify"
    pub friendly_name: String,
    /// Name of the product hosting the source, e.g. "Living Room"
    pub product_friendly_name: String,
    pub source_type: SourceType,
    /// The source is physically hosted on another device
    pub borrowed: bool,
}

impl Source {
    pub fn new(
        id: impl Into<String>,
        friendly_name: impl Into<String>,
        source_type: impl Into<SourceType>,
    ) -> Self {
        Self {
            id: id.into(),
            friendly_name: friendly_name.into(),
            product_friendly_name: String::new(),
            source_type: source_type.into(),
            borrowed: false,
        }
    }

    /// Mark the source as hosted on the named product
    pub fn borrowed_from(mut self, product_friendly_name: impl Into<String>) -> Self {
        self.product_friendly_name = product_friendly_name.into();
        self.borrowed = true;
        self
    }

    /// Name to show in the sources menu
    ///
    /// Borrowed sources carry the hosting product's name so two "Spotify"
    /// entries from different speakers can be told apart.
    pub fn display_name(&self) -> String {
        if self.borrowed {
            format!("{} ({})", self.friendly_name, self.product_friendly_name)
        } else {
            self.friendly_name.clone()
        }
    }
}
