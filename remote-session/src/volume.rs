//! Volume sync between the local slider and the device
//!
//! Two producers write the volume: the user dragging the slider and the
//! device pushing VolumeChange notifications. While the user drags, every
//! push from the device is most likely the echo of a `setVolume` we sent a
//! moment ago; letting it through would make the slider jump back under
//! the user's mouse. So the coordinator runs a small state machine:
//!
//! ```text
//!            local move (value differs)
//!   Idle ─────────────────────────────────▶ UserDriving
//!    ▲                                          │
//!    └──── debounce elapsed  /  drag released ──┘
//! ```
//!
//! In `UserDriving` remote values are recorded but never displayed.
//!
//! The coordinator does no I/O and owns no timer. It returns
//! [`VolumeEffect`]s that the session worker carries out; debounce firings
//! come back as [`VolumeSync::debounce_elapsed`] with the token that armed
//! them, and only the most recently armed token is honoured.

/// Upper bound of the device volume scale
pub const MAX_VOLUME: u8 = 100;

/// Which producer currently owns the displayed value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumePhase {
    /// Remote pushes are authoritative
    Idle,
    /// The user is dragging; remote pushes are suppressed
    UserDriving,
}

/// Identifies one arming of the debounce timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceToken(u64);

/// Side effect requested by the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeEffect {
    /// Send `setVolume(level)` to the device
    Send(u8),
    /// (Re)start the debounce timer, cancelling any pending one
    ArmDebounce(DebounceToken),
    /// Cancel the pending debounce timer
    CancelDebounce,
}

#[derive(Debug, Clone)]
pub struct VolumeSync {
    level: u8,
    phase: VolumePhase,
    last_remote: Option<u8>,
    token: u64,
    armed: bool,
}

impl Default for VolumeSync {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeSync {
    pub fn new() -> Self {
        Self {
            level: 0,
            phase: VolumePhase::Idle,
            last_remote: None,
            token: 0,
            armed: false,
        }
    }

    /// The displayed volume level
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn phase(&self) -> VolumePhase {
        self.phase
    }

    /// Remote pushes are currently kept off the display
    pub fn is_suppressed(&self) -> bool {
        self.phase == VolumePhase::UserDriving
    }

    /// Last level the device reported, displayed or not
    pub fn last_remote(&self) -> Option<u8> {
        self.last_remote
    }

    /// The user moved the slider to `value`
    ///
    /// `release` marks the final event of a drag (mouse-up). A release ends
    /// suppression immediately, whatever the debounce timer says.
    pub fn local_change(&mut self, value: u8, release: bool) -> Vec<VolumeEffect> {
        let value = value.min(MAX_VOLUME);
        let changed = value != self.level;
        let mut effects = Vec::new();

        if changed {
            self.level = value;
            if self.phase == VolumePhase::Idle {
                tracing::debug!("User is moving the slider, suppressing remote volume");
                self.phase = VolumePhase::UserDriving;
            }
            tracing::debug!("send: {}", value);
            effects.push(VolumeEffect::Send(value));
        }

        if release {
            if self.armed {
                self.armed = false;
                effects.push(VolumeEffect::CancelDebounce);
            }
            if self.phase == VolumePhase::UserDriving {
                tracing::debug!("Slider released, accepting remote volume");
                self.phase = VolumePhase::Idle;
            }
        } else if changed {
            self.token += 1;
            self.armed = true;
            effects.push(VolumeEffect::ArmDebounce(DebounceToken(self.token)));
        }

        effects
    }

    /// The device reported `level`
    ///
    /// Returns whether the displayed value was written.
    pub fn remote_change(&mut self, level: u8) -> bool {
        let level = level.min(MAX_VOLUME);
        self.last_remote = Some(level);

        match self.phase {
            VolumePhase::UserDriving => {
                tracing::debug!("receive: {} (ignored)", level);
                false
            }
            VolumePhase::Idle => {
                tracing::debug!("receive: {}", level);
                self.level = level;
                true
            }
        }
    }

    /// The debounce timer armed with `token` fired
    ///
    /// Returns whether this ended suppression. Firings of superseded or
    /// cancelled timers are ignored.
    pub fn debounce_elapsed(&mut self, token: DebounceToken) -> bool {
        if !self.armed || token.0 != self.token {
            tracing::trace!("Ignoring stale debounce {:?}", token);
            return false;
        }

        self.armed = false;
        if self.phase == VolumePhase::UserDriving {
            tracing::debug!("User is no longer moving the slider");
            self.phase = VolumePhase::Idle;
        }
        true
    }

    /// Forget the drag in progress (device switch or disconnect)
    ///
    /// The displayed level is kept until the next device reports its own.
    pub fn reset(&mut self) -> Option<VolumeEffect> {
        self.phase = VolumePhase::Idle;
        self.last_remote = None;
        if self.armed {
            self.armed = false;
            Some(VolumeEffect::CancelDebounce)
        } else {
            None
        }
    }
}
