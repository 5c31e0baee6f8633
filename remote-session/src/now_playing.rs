//! What the info panel and transport buttons show

use remote_core::{PlaybackState, Source, SourceType};

/// Two-line info panel text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub title: String,
    pub subtitle: String,
}

impl Default for NowPlaying {
    fn default() -> Self {
        Self {
            title: "-".to_string(),
            subtitle: "-".to_string(),
        }
    }
}

/// Playback-related display state driven by device notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    pub now_playing: NowPlaying,
    pub playback: PlaybackState,
    /// Play/pause/next/back and the volume slider accept input
    pub controls_enabled: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            now_playing: NowPlaying::default(),
            playback: PlaybackState::Unknown,
            controls_enabled: true,
        }
    }
}

impl PlayerState {
    pub fn is_playing(&self) -> bool {
        self.playback == PlaybackState::Play
    }

    pub fn on_progress(&mut self, state: PlaybackState) {
        self.playback = state;
    }

    /// Line-in has no transport to control, so controls go inactive
    pub fn on_source_change(&mut self, source: &Source) {
        self.now_playing = if source.friendly_name.is_empty() {
            NowPlaying::default()
        } else {
            NowPlaying {
                title: source.friendly_name.clone(),
                subtitle: "Connected to".to_string(),
            }
        };
        self.controls_enabled = source.source_type != SourceType::LineIn;
    }

    pub fn on_radio(&mut self, name: &str, live_description: &str) {
        self.now_playing = NowPlaying {
            title: live_description.to_string(),
            subtitle: name.to_string(),
        };
    }

    pub fn on_stored_music(&mut self, name: &str, artist: &str) {
        self.now_playing = NowPlaying {
            title: artist.to_string(),
            subtitle: name.to_string(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_change() {
        let mut player = PlayerState::default();
        player.on_source_change(&Source::new("spotify:1", "Spotify", "SPOTIFY"));

        assert_eq!(player.now_playing.title, "Spotify");
        assert_eq!(player.now_playing.subtitle, "Connected to");
        assert!(player.controls_enabled);
    }

    #[test]
    fn test_unnamed_source_resets_panel() {
        let mut player = PlayerState::default();
        player.on_radio("DR P3", "News");
        player.on_source_change(&Source::new("", "", "DLNA"));

        assert_eq!(player.now_playing, NowPlaying::default());
    }

    #[test]
    fn test_line_in_disables_controls() {
        let mut player = PlayerState::default();
        player.on_source_change(&Source::new("linein:1", "Line-In", "LINE IN"));
        assert!(!player.controls_enabled);

        player.on_source_change(&Source::new("radio:1", "TuneIn", "TUNEIN"));
        assert!(player.controls_enabled);
    }

    #[test]
    fn test_now_playing_text() {
        let mut player = PlayerState::default();

        player.on_radio("DR P3", "Morning show");
        assert_eq!(player.now_playing.title, "Morning show");
        assert_eq!(player.now_playing.subtitle, "DR P3");

        player.on_stored_music("Blue in Green", "Miles Davis");
        assert_eq!(player.now_playing.title, "Miles Davis");
        assert_eq!(player.now_playing.subtitle, "Blue in Green");
    }

    #[test]
    fn test_progress() {
        let mut player = PlayerState::default();
        assert!(!player.is_playing());
        player.on_progress(PlaybackState::Play);
        assert!(player.is_playing());
        player.on_progress(PlaybackState::Pause);
        assert!(!player.is_playing());
    }
}
