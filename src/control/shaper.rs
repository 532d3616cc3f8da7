//! # Axis Shaper Module
//!
//! Deadzone removal and response-rate smoothing for control axes.
//!
//! ## Deadzone
//!
//! A deadzone suppresses noise from a centered control. Values inside the
//! band collapse to 0; values outside are rescaled so the output is
//! continuous at the band edge and still reaches full scale:
//!
//! ```text
//! sign(raw) * (|raw| - dz) / (1 - dz)
//! ```
//!
//! ## Response rate
//!
//! The shaped output chases the deadzone-corrected raw value through a
//! first-order low-pass filter:
//!
//! ```text
//! out = prev + (corrected - prev) * rate
//! ```
//!
//! `rate` is a per-tick blend coefficient in (0, 1] - filter gain, not a
//! maximum slew speed. Larger is snappier, smaller filters harder.
//!
//! ## Usage
//!
//! ```
//! use rc_bridge::control::shaper::AxisShaper;
//!
//! let mut steer = AxisShaper::new(0.2, 0.05).unwrap();
//!
//! // One tick of full deflection from rest moves 20% of the way there
//! let out = steer.shape(1.0);
//! assert!((out - 0.2).abs() < 1e-6);
//! ```

use crate::error::{RcBridgeError, Result};

/// Applies the deadzone step alone to a raw sample.
///
/// Used by the secondary head-tracking source, which wants deadzone removal
/// without smoothing. `deadzone` must already be validated to [0, 1).
///
/// # Examples
///
/// ```
/// use rc_bridge::control::shaper::apply_deadzone;
///
/// assert_eq!(apply_deadzone(0.03, 0.05), 0.0);
/// assert!((apply_deadzone(1.0, 0.05) - 1.0).abs() < 1e-6);
/// assert!(apply_deadzone(-0.5, 0.05) < 0.0);
/// ```
#[must_use]
pub fn apply_deadzone(raw: f32, deadzone: f32) -> f32 {
    if raw.abs() < deadzone {
        0.0
    } else {
        (raw.abs() - deadzone) / (1.0 - deadzone) * raw.signum()
    }
}

/// One smoothed control axis.
///
/// Retains the previous tick's output; `shape` advances it by one tick.
/// Created at loop start with value 0 and lives for the whole session.
#[derive(Debug, Clone, Copy)]
pub struct AxisShaper {
    /// Last tick's output value.
    value: f32,
    /// Per-tick blend coefficient, (0, 1].
    rate: f32,
    /// Deadzone fraction, [0, 1).
    deadzone: f32,
}

impl AxisShaper {
    /// Creates a shaper with the given response rate and deadzone.
    ///
    /// # Arguments
    ///
    /// * `rate` - Per-tick blend coefficient, must be in (0, 1]
    /// * `deadzone` - Deadzone fraction, must be in [0, 1)
    ///
    /// # Errors
    ///
    /// Out-of-range values are configuration errors and fail fast here
    /// rather than being clamped.
    pub fn new(rate: f32, deadzone: f32) -> Result<Self> {
        if !(rate > 0.0 && rate <= 1.0) {
            return Err(RcBridgeError::Controller(format!(
                "response rate {} outside (0, 1]",
                rate
            )));
        }
        if !(0.0..1.0).contains(&deadzone) {
            return Err(RcBridgeError::Controller(format!(
                "deadzone {} outside [0, 1)",
                deadzone
            )));
        }

        Ok(Self {
            value: 0.0,
            rate,
            deadzone,
        })
    }

    /// Returns the current (last shaped) output value.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Returns the configured response rate.
    #[must_use]
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Returns the configured deadzone fraction.
    #[must_use]
    pub fn deadzone(&self) -> f32 {
        self.deadzone
    }

    /// Replaces the response rate, e.g. when a profile is switched.
    ///
    /// # Errors
    ///
    /// Same validation as [`AxisShaper::new`].
    pub fn set_rate(&mut self, rate: f32) -> Result<()> {
        if !(rate > 0.0 && rate <= 1.0) {
            return Err(RcBridgeError::Controller(format!(
                "response rate {} outside (0, 1]",
                rate
            )));
        }
        self.rate = rate;
        Ok(())
    }

    /// Advances the axis by one tick toward `raw`.
    ///
    /// Applies deadzone removal, then blends the previous output toward the
    /// corrected value by `rate`. Returns the new output; the same value is
    /// retained as state for the next tick.
    pub fn shape(&mut self, raw: f32) -> f32 {
        let corrected = apply_deadzone(raw, self.deadzone);
        self.value += (corrected - self.value) * self.rate;
        self.value
    }
}
