//! Read-side snapshot for the presentation layer
//!
//! The session worker publishes a fresh [`SessionView`] after every message
//! it handles. Readers clone it out of the lock and never see a
//! half-applied update.

use remote_core::{Device, LinkState};

use crate::catalog::CatalogEntry;
use crate::now_playing::{NowPlaying, PlayerState};
use crate::radio::RadioPreset;

/// Where the session stands with its device
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting(Device),
    Connected(Device),
    Failed { device: Device, reason: String },
}

impl ConnectionStatus {
    pub fn device(&self) -> Option<&Device> {
        match self {
            ConnectionStatus::Disconnected => None,
            ConnectionStatus::Connecting(device)
            | ConnectionStatus::Connected(device)
            | ConnectionStatus::Failed { device, .. } => Some(device),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected(_))
    }
}

/// Last ConnectionChange the device reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkStatus {
    pub state: LinkState,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VolumeView {
    pub level: u8,
    /// The user is dragging and remote values are held back
    pub suppressed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogView {
    /// Filtered sources in device order, at most one `selected`
    pub entries: Vec<CatalogEntry>,
    pub current_source_id: Option<String>,
    /// The sources menu section (and its separator) should be shown
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// Status item title
    pub title: String,
    pub status: ConnectionStatus,
    pub link: Option<LinkStatus>,
    pub volume: VolumeView,
    pub catalog: CatalogView,
    pub now_playing: NowPlaying,
    pub playing: bool,
    pub controls_enabled: bool,
    pub radio_presets: Vec<RadioPreset>,
    pub radio_visible: bool,
}

impl SessionView {
    pub(crate) fn initial(title: &str, radio_presets: Vec<RadioPreset>) -> Self {
        let player = PlayerState::default();
        Self {
            title: title.to_string(),
            status: ConnectionStatus::Disconnected,
            link: None,
            volume: VolumeView::default(),
            catalog: CatalogView::default(),
            now_playing: player.now_playing.clone(),
            playing: player.is_playing(),
            controls_enabled: player.controls_enabled,
            radio_presets,
            radio_visible: false,
        }
    }
}
