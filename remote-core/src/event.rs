//! Inbound device notifications

use std::fmt;
use std::sync::Arc;

use crate::source::Source;

/// Transport state reported by Progress notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    Play,
    Pause,
    Stop,
    #[default]
    Unknown,
}

/// Link state reported by ConnectionChange notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Online,
    Offline,
    Error,
}

/// A notification pushed by a device
///
/// This is a closed set: a transport that receives a payload it cannot map
/// onto one of these variants drops it and logs, rather than guessing.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    Progress {
        state: PlaybackState,
        /// Playback position in seconds
        position: u32,
    },
    VolumeChange {
        level: u8,
    },
    SourceChange(Source),
    ConnectionChange {
        state: LinkState,
        message: String,
    },
    NowPlayingRadio {
        name: String,
        live_description: String,
    },
    NowPlayingStoredMusic {
        name: String,
        artist: String,
    },
}

/// Discriminant of [`DeviceEvent`], used to subscribe to one kind of event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Progress,
    VolumeChange,
    SourceChange,
    ConnectionChange,
    NowPlayingRadio,
    NowPlayingStoredMusic,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Progress,
        EventKind::VolumeChange,
        EventKind::SourceChange,
        EventKind::ConnectionChange,
        EventKind::NowPlayingRadio,
        EventKind::NowPlayingStoredMusic,
    ];
}

impl DeviceEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DeviceEvent::Progress { .. } => EventKind::Progress,
            DeviceEvent::VolumeChange { .. } => EventKind::VolumeChange,
            DeviceEvent::SourceChange(_) => EventKind::SourceChange,
            DeviceEvent::ConnectionChange { .. } => EventKind::ConnectionChange,
            DeviceEvent::NowPlayingRadio { .. } => EventKind::NowPlayingRadio,
            DeviceEvent::NowPlayingStoredMusic { .. } => EventKind::NowPlayingStoredMusic,
        }
    }
}

/// Destination for a connection's inbound notifications
///
/// Handed to [`DeviceConnection::start_notifications`](crate::DeviceConnection::start_notifications).
/// `emit` returns `false` once nobody is listening anymore, which a
/// transport may take as a cue to stop its feed.
#[derive(Clone)]
pub struct EventSink {
    emit: Arc<dyn Fn(DeviceEvent) -> bool + Send + Sync>,
}

impl EventSink {
    pub fn new<F>(emit: F) -> Self
    where
        F: Fn(DeviceEvent) -> bool + Send + Sync + 'static,
    {
        Self {
            emit: Arc::new(emit),
        }
    }

    /// Push one event; returns `false` if the receiving side is gone
    pub fn emit(&self, event: DeviceEvent) -> bool {
        (self.emit)(event)
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_kind_covers_every_variant() {
        let events = vec![
            DeviceEvent::Progress {
                state: PlaybackState::Play,
                position: 12,
            },
            DeviceEvent::VolumeChange { level: 30 },
            DeviceEvent::SourceChange(Source::new("radio:1", "TuneIn", "TUNEIN")),
            DeviceEvent::ConnectionChange {
                state: LinkState::Online,
                message: String::new(),
            },
            DeviceEvent::NowPlayingRadio {
                name: "DR P3".to_string(),
                live_description: "News".to_string(),
            },
            DeviceEvent::NowPlayingStoredMusic {
                name: "Song".to_string(),
                artist: "Artist".to_string(),
            },
        ];

        let kinds: Vec<EventKind> = events.iter().map(DeviceEvent::kind).collect();
        assert_eq!(kinds, EventKind::ALL.to_vec());
    }

    #[test]
    fn test_sink_forwards() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let sink = EventSink::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });

        let clone = sink.clone();
        assert!(sink.emit(DeviceEvent::VolumeChange { level: 1 }));
        assert!(clone.emit(DeviceEvent::VolumeChange { level: 2 }));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
