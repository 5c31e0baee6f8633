//! Fire-and-forget device commands

use std::fmt;

/// A command the session can send to the active device
///
/// Commands do not return a value the caller waits on. A failed command is
/// reported as a [`ControlError`](crate::ControlError) to whoever executes
/// it, which only logs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    Play,
    Pause,
    Next,
    Back,
    /// Join the multiroom experience playing elsewhere
    Join,
    /// Leave the multiroom experience
    Leave,
    /// Set the absolute volume level (0-100)
    SetVolume(u8),
    /// Change the volume relative to its current level
    AdjustVolume(i32),
    /// Switch to the source with the given catalog id
    SetSource(String),
    /// Tune in to a radio station
    TuneIn { id: String, name: String },
}

impl DeviceCommand {
    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            DeviceCommand::Play => "play",
            DeviceCommand::Pause => "pause",
            DeviceCommand::Next => "next",
            DeviceCommand::Back => "back",
            DeviceCommand::Join => "join",
            DeviceCommand::Leave => "leave",
            DeviceCommand::SetVolume(_) => "setVolume",
            DeviceCommand::AdjustVolume(_) => "adjustVolume",
            DeviceCommand::SetSource(_) => "setSource",
            DeviceCommand::TuneIn { .. } => "tuneIn",
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceCommand::SetVolume(level) => write!(f, "setVolume({})", level),
            DeviceCommand::AdjustVolume(delta) => write!(f, "adjustVolume({:+})", delta),
            DeviceCommand::SetSource(id) => write!(f, "setSource({})", id),
            DeviceCommand::TuneIn { id, name } => write!(f, "tuneIn({}, {})", id, name),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(DeviceCommand::Play.to_string(), "play");
        assert_eq!(DeviceCommand::AdjustVolume(4).to_string(), "adjustVolume(+4)");
        assert_eq!(DeviceCommand::AdjustVolume(-4).to_string(), "adjustVolume(-4)");
        assert_eq!(
            DeviceCommand::TuneIn {
                id: "s24861".to_string(),
                name: "DR P3".to_string()
            }
            .to_string(),
            "tuneIn(s24861, DR P3)"
        );
    }
}
