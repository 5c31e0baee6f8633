//! Global hotkeys mapped to remote-control commands
//!
//! The binding table is built once at startup from configuration. The
//! dispatcher only fires after an OS accessibility permission check has
//! passed; a failed check disables it for the rest of the process.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use remote_core::DeviceCommand;
use thiserror::Error;

/// The closed set of hotkey commands
///
/// `PrevSource`, `NextSource`, `TogglePlayPause` and `Mute` can be bound
/// but do nothing yet; see [`Command::is_implemented`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Command {
    Leave,
    Join,
    PrevSource,
    NextSource,
    Back,
    TogglePlayPause,
    Next,
    Mute,
    VolumeDown,
    VolumeUp,
}

impl Command {
    pub const ALL: [Command; 10] = [
        Command::Leave,
        Command::Join,
        Command::PrevSource,
        Command::NextSource,
        Command::Back,
        Command::TogglePlayPause,
        Command::Next,
        Command::Mute,
        Command::VolumeDown,
        Command::VolumeUp,
    ];

    /// Name used in configuration keys (`[hotkeys.keys] VolumeUp = "111"`)
    pub fn name(&self) -> &'static str {
        match self {
            Command::Leave => "Leave",
            Command::Join => "Join",
            Command::PrevSource => "PrevSource",
            Command::NextSource => "NextSource",
            Command::Back => "Back",
            Command::TogglePlayPause => "TogglePlayPause",
            Command::Next => "Next",
            Command::Mute => "Mute",
            Command::VolumeDown => "VolumeDown",
            Command::VolumeUp => "VolumeUp",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Command::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Built-in key code (macOS virtual key codes F1..F12)
    pub fn default_key_code(&self) -> u16 {
        match self {
            Command::Leave => 122, // F1
            Command::Join => 120, // F2
            Command::PrevSource => 96, // F5
            Command::NextSource => 97, // F6
            Command::Back => 98, // F7
            Command::TogglePlayPause => 100, // F8
            Command::Next => 101, // F9
            Command::Mute => 109, // F10
            Command::VolumeDown => 103, // F11
            Command::VolumeUp => 111, // F12
        }
    }

    pub fn is_implemented(&self) -> bool {
        self.device_command(1).is_some()
    }

    /// The single device command this hotkey sends, if any
    ///
    /// `volume_step` is the delta applied by `VolumeUp`/`VolumeDown`.
    pub fn device_command(&self, volume_step: u8) -> Option<DeviceCommand> {
        match self {
            Command::Leave => Some(DeviceCommand::Leave),
            Command::Join => Some(DeviceCommand::Join),
            Command::Back => Some(DeviceCommand::Back),
            Command::Next => Some(DeviceCommand::Next),
            Command::VolumeDown => Some(DeviceCommand::AdjustVolume(-i32::from(volume_step))),
            Command::VolumeUp => Some(DeviceCommand::AdjustVolume(i32::from(volume_step))),
            Command::PrevSource | Command::NextSource | Command::TogglePlayPause | Command::Mute => {
                None
            }
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Key code → command table
#[derive(Debug, Clone, Default)]
pub struct HotkeyBindings {
    map: HashMap<u16, Command>,
}

impl HotkeyBindings {
    /// Every command on its built-in key
    pub fn defaults() -> Self {
        Self::with_overrides(&BTreeMap::new())
    }

    /// Every command on its override key, or its built-in key when there is
    /// no override
    ///
    /// When two commands end up on the same key the one listed first in
    /// [`Command::ALL`] keeps it.
    pub fn with_overrides(overrides: &BTreeMap<Command, u16>) -> Self {
        let mut map = HashMap::new();

        for command in Command::ALL {
            let key_code = overrides
                .get(&command)
                .copied()
                .unwrap_or_else(|| command.default_key_code());

            if let Some(existing) = map.get(&key_code) {
                tracing::warn!(
                    "hotkeys.{}: key code {} already bound to {}, ignoring",
                    command,
                    key_code,
                    existing
                );
                continue;
            }

            tracing::debug!("hotkeys.{}: {}", command, key_code);
            map.insert(key_code, command);
        }

        Self { map }
    }

    pub fn get(&self, key_code: u16) -> Option<Command> {
        self.map.get(&key_code).copied()
    }

    pub fn key_code_for(&self, command: Command) -> Option<u16> {
        self.map
            .iter()
            .find(|(_, bound)| **bound == command)
            .map(|(code, _)| *code)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// OS accessibility permission check
pub trait AccessibilityPermission {
    fn is_trusted(&self) -> bool;
}

impl<F> AccessibilityPermission for F
where
    F: Fn() -> bool,
{
    fn is_trusted(&self) -> bool {
        self()
    }
}

/// Receiver of matched hotkey commands
///
/// Implementations must return without waiting on the device.
pub trait CommandSink {
    fn dispatch(&self, command: Command);
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HotkeyError {
    #[error("required permission to control this computer using accessibility features is missing")]
    PermissionDenied,
}

/// Outcome of the accessibility check, shared by every dispatcher built
/// from the same gate
///
/// Once any of them is denied, all of them stay denied.
#[derive(Debug, Clone, Default)]
pub struct PermissionGate {
    denied: Arc<AtomicBool>,
}

impl PermissionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_denied(&self) -> bool {
        self.denied.load(Ordering::SeqCst)
    }

    fn deny(&self) {
        self.denied.store(true, Ordering::SeqCst);
    }
}

/// Dispatcher lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Disabled,
    Enabled,
    /// The permission check failed; stays disabled for the process lifetime
    PermissionDenied,
}

/// Maps global key-down events to commands and hands them to a sink
pub struct HotkeyDispatcher<S: CommandSink> {
    bindings: HotkeyBindings,
    state: DispatcherState,
    gate: PermissionGate,
    sink: S,
}

impl<S: CommandSink> HotkeyDispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self::with_gate(sink, PermissionGate::new())
    }

    /// Dispatcher whose permission outcome is shared through `gate`
    pub fn with_gate(sink: S, gate: PermissionGate) -> Self {
        let state = if gate.is_denied() {
            DispatcherState::PermissionDenied
        } else {
            DispatcherState::Disabled
        };
        Self {
            bindings: HotkeyBindings::default(),
            state,
            gate,
            sink,
        }
    }

    pub fn register(&mut self, bindings: HotkeyBindings) {
        tracing::debug!("Registered {} hotkeys", bindings.len());
        for command in Command::ALL {
            if let Some(key_code) = bindings.key_code_for(command) {
                if !command.is_implemented() {
                    tracing::debug!("hotkey {} bound to {} (not implemented)", key_code, command);
                }
            }
        }
        self.bindings = bindings;
    }

    pub fn bindings(&self) -> &HotkeyBindings {
        &self.bindings
    }

    pub fn state(&self) -> DispatcherState {
        self.state
    }

    /// Start matching key events
    ///
    /// Checks `permission` once. If the check fails the dispatcher is
    /// permanently disabled and every later call returns the same error
    /// without checking again.
    pub fn enable(&mut self, permission: &dyn AccessibilityPermission) -> Result<(), HotkeyError> {
        if self.gate.is_denied() {
            self.state = DispatcherState::PermissionDenied;
        }
        match self.state {
            DispatcherState::PermissionDenied => Err(HotkeyError::PermissionDenied),
            DispatcherState::Enabled => Ok(()),
            DispatcherState::Disabled => {
                if !permission.is_trusted() {
                    tracing::error!("hotkeys setup failed: {}", HotkeyError::PermissionDenied);
                    self.state = DispatcherState::PermissionDenied;
                    self.gate.deny();
                    return Err(HotkeyError::PermissionDenied);
                }
                tracing::info!("hotkeys setup");
                self.state = DispatcherState::Enabled;
                Ok(())
            }
        }
    }

    pub fn disable(&mut self) {
        if self.state == DispatcherState::Enabled {
            tracing::info!("hotkeys disabled");
            self.state = DispatcherState::Disabled;
        }
    }

    /// Handle one global key-down event
    ///
    /// Unbound keys are ignored silently. Returns the dispatched command.
    pub fn on_key_down(&self, key_code: u16) -> Option<Command> {
        if self.state != DispatcherState::Enabled {
            return None;
        }

        let command = self.bindings.get(key_code)?;
        tracing::debug!("hotkey command: {}", command);
        self.sink.dispatch(command);
        Some(command)
    }
}
