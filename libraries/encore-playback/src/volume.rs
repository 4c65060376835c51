//! Volume control
//!
//! Volume range is 0-100%. Muting keeps the level so unmuting restores it.
//! The level maps to output gain linearly by default, or through a dB curve
//! (-60 dB to 0 dB) when configured.

use crate::types::GainCurve;

/// Volume controller
#[derive(Debug, Clone)]
pub struct Volume {
    /// Volume level (0-100)
    level: u8,

    /// Mute state (preserves volume level)
    muted: bool,

    curve: GainCurve,
}

impl Volume {
    /// Create new volume controller
    ///
    /// # Arguments
    /// * `level` - Initial volume (clamped to 0-100)
    /// * `curve` - Level to gain mapping
    pub fn new(level: u8, curve: GainCurve) -> Self {
        Self {
            level: level.min(100),
            muted: false,
            curve,
        }
    }

    /// Set volume level (0-100)
    ///
    /// A non-zero level unmutes.
    pub fn set_level(&mut self, level: u8) {
        self.level = level.min(100);
        if self.muted && self.level > 0 {
            self.muted = false;
        }
    }

    /// Get current volume level (0-100)
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Toggle mute state
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Level actually sent to the output (0 while muted)
    pub fn effective_level(&self) -> u8 {
        if self.muted {
            0
        } else {
            self.level
        }
    }

    /// Gain multiplier for the audio resource
    ///
    /// Returns 0.0 if muted.
    pub fn gain(&self) -> f32 {
        let level = self.effective_level();
        if level == 0 {
            return 0.0;
        }

        match self.curve {
            GainCurve::Linear => f32::from(level) / 100.0,
            GainCurve::Logarithmic => {
                // Map 0-100% to -60 dB to 0 dB
                let db = (f32::from(level) - 100.0) * 0.6;
                10.0_f32.powf(db / 20.0)
            }
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(70, GainCurve::Linear)
    }
}
