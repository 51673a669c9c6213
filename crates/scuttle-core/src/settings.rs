//! Tunable settings persisted by the host between sessions.
//!
//! The engine only reads the countdown delay at arm time, so a host may
//! adjust settings freely while a sequence is idle; changes made during a
//! countdown take effect on the next arm.

use crate::fixed::Fixed64;
use serde::{Deserialize, Serialize};

/// Minimum configurable countdown delay, in seconds.
pub const DELAY_MIN_SECONDS: u64 = 1;

/// Maximum configurable countdown delay, in seconds.
pub const DELAY_MAX_SECONDS: u64 = 60;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when validating settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("countdown delay {seconds} s out of range ({DELAY_MIN_SECONDS}-{DELAY_MAX_SECONDS} s)")]
    DelayOutOfRange { seconds: f64 },
}

// ---------------------------------------------------------------------------
// Staging mode
// ---------------------------------------------------------------------------

/// What a staging activation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StagingMode {
    /// Arm the full self-destruct countdown.
    SelfDestruct,
    /// Destroy the initiator's parent (and the initiator) immediately.
    DetonateParent,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Persisted tunables for the self-destruct sequencer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestructSettings {
    /// Countdown delay in seconds. Valid range 1-60.
    #[serde(default = "default_delay")]
    pub delay_seconds: Fixed64,
    /// Whether countdown progress is shown on the status display.
    #[serde(default = "default_true")]
    pub show_countdown: bool,
    /// Whether staging activation may trigger this part.
    #[serde(default = "default_true")]
    pub can_stage: bool,
    /// What staging activation does.
    #[serde(default = "default_staging_mode")]
    pub staging_mode: StagingMode,
}

fn default_delay() -> Fixed64 {
    Fixed64::from_num(10)
}

fn default_true() -> bool {
    true
}

fn default_staging_mode() -> StagingMode {
    StagingMode::SelfDestruct
}

impl Default for DestructSettings {
    fn default() -> Self {
        Self {
            delay_seconds: default_delay(),
            show_countdown: true,
            can_stage: true,
            staging_mode: default_staging_mode(),
        }
    }
}

impl DestructSettings {
    /// Check that the configured delay is within the valid range.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let min = Fixed64::from_num(DELAY_MIN_SECONDS);
        let max = Fixed64::from_num(DELAY_MAX_SECONDS);
        if self.delay_seconds < min || self.delay_seconds > max {
            return Err(SettingsError::DelayOutOfRange {
                seconds: self.delay_seconds.to_num::<f64>(),
            });
        }
        Ok(())
    }

    /// The delay clamped into the valid range. Read at arm time.
    pub fn effective_delay(&self) -> Fixed64 {
        self.delay_seconds.clamp(
            Fixed64::from_num(DELAY_MIN_SECONDS),
            Fixed64::from_num(DELAY_MAX_SECONDS),
        )
    }

    /// Set the delay, clamping into the valid range.
    pub fn set_delay_seconds(&mut self, seconds: Fixed64) {
        self.delay_seconds = seconds.clamp(
            Fixed64::from_num(DELAY_MIN_SECONDS),
            Fixed64::from_num(DELAY_MAX_SECONDS),
        );
    }
}
