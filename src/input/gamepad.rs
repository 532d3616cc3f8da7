//! # Gamepad Module
//!
//! Game controller input via the Linux evdev interface.
//!
//! ## Detection
//!
//! Any device under `/dev/input/event*` that reports both stick axes
//! (ABS_X/ABS_Y) and the gamepad button signature (BTN_SOUTH) is accepted;
//! the scan is sorted so selection is deterministic when several devices
//! are present.
//!
//! ## Axis Slots
//!
//! Axes are exposed as numbered slots, normalized to [-1, 1] from the
//! range each device reports. The slot order follows the DualSense layout:
//!
//! | Slot | evdev Code | Input | Use |
//! |------|------------|---------------|----------------------|
//! | 0 | ABS_X | Left Stick X | Steering |
//! | 1 | ABS_Y | Left Stick Y | (unused) |
//! | 2 | ABS_Z | Right Stick X | Head yaw (secondary) |
//! | 3 | ABS_RZ | Right Stick Y | Head pitch (secondary)|
//! | 4 | ABS_RX | L2 Trigger | Reverse trigger |
//! | 5 | ABS_RY | R2 Trigger | Throttle |
//!
//! Triggers rest at their range minimum, so a released trigger normalizes
//! to -1.0 and `(raw + 1) / 2` rescales it to 0.
//!
//! ## Polling
//!
//! The device is polled once per tick through the absolute-axis and key
//! state ioctls, which never block and collapse any events since the last
//! tick into the current hardware state. A failed poll means the device is
//! gone; the caller drops the handle and retries discovery on its slower
//! cadence.

use evdev::{AbsoluteAxisType, Device, Key};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{RcBridgeError, Result};

/// Number of exposed axis slots.
pub const AXIS_SLOTS: usize = 6;

/// Axis slot order (DualSense layout).
const AXIS_CODES: [AbsoluteAxisType; AXIS_SLOTS] = [
    AbsoluteAxisType::ABS_X,
    AbsoluteAxisType::ABS_Y,
    AbsoluteAxisType::ABS_Z,
    AbsoluteAxisType::ABS_RZ,
    AbsoluteAxisType::ABS_RX,
    AbsoluteAxisType::ABS_RY,
];

/// Steering axis slot (left stick X).
pub const AXIS_STEERING: usize = 0;
/// Secondary head-tracking yaw slot (right stick X).
pub const AXIS_HEAD_X: usize = 2;
/// Secondary head-tracking pitch slot (right stick Y).
pub const AXIS_HEAD_Y: usize = 3;
/// Throttle axis slot (R2 trigger).
pub const AXIS_THROTTLE: usize = 5;

/// One tick's worth of controller state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GamepadSnapshot {
    /// Normalized axis values, [-1, 1] per slot.
    pub axes: [f32; AXIS_SLOTS],
    /// Which slots the device actually exposes.
    pub present: [bool; AXIS_SLOTS],
    /// Share/Select button (calibrate command).
    pub btn_share: bool,
    /// Options/Start button (pause command).
    pub btn_options: bool,
}

impl GamepadSnapshot {
    /// Returns the normalized value of an axis slot, 0.0 if out of range.
    #[must_use]
    pub fn axis(&self, slot: usize) -> f32 {
        self.axes.get(slot).copied().unwrap_or(0.0)
    }

    /// True when the device exposes this axis slot.
    ///
    /// Trigger slots need this distinction: a missing trigger must read as
    /// released (0 after rescaling), not as the mid-travel value a plain
    /// 0.0 would rescale to.
    #[must_use]
    pub fn has_axis(&self, slot: usize) -> bool {
        self.present.get(slot).copied().unwrap_or(false)
    }
}

/// An open game controller.
pub struct Gamepad {
    device: Device,
    device_path: String,
    present: [bool; AXIS_SLOTS],
}

impl std::fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gamepad")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl Gamepad {
    /// Detect and open the first available game controller
    ///
    /// Scans `/dev/input/event*` (sorted) and accepts the first device with
    /// a gamepad signature.
    ///
    /// # Errors
    ///
    /// - [`RcBridgeError::ControllerNotFound`]: no gamepad on the system
    /// - [`RcBridgeError::Controller`]: `/dev/input` unreadable
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rc_bridge::input::gamepad::Gamepad;
    ///
    /// let pad = Gamepad::open()?;
    /// println!("Connected to controller at: {}", pad.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open() -> Result<Self> {
        let input_dir = Path::new("/dev/input");

        if !input_dir.exists() {
            return Err(RcBridgeError::Controller(
                "/dev/input directory not found".to_string(),
            ));
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| RcBridgeError::Controller(format!("Failed to read /dev/input: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                RcBridgeError::Controller(format!("Failed to read directory entry: {}", e))
            })?;

        // Deterministic selection when multiple controllers are connected
        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let Some(filename) = path.file_name() else {
                continue;
            };
            if !filename.to_string_lossy().starts_with("event") {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    if Self::is_gamepad(&device) {
                        let device_path = path.to_string_lossy().to_string();
                        info!(
                            "Found controller '{}' at {}",
                            device.name().unwrap_or("unknown"),
                            device_path
                        );

                        let present = Self::present_axes(&device);
                        return Ok(Gamepad {
                            device,
                            device_path,
                            present,
                        });
                    }
                    debug!("Skipping non-gamepad device: {}", path.display());
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(RcBridgeError::ControllerNotFound)
    }

    /// Records which axis slots the device advertises.
    fn present_axes(device: &Device) -> [bool; AXIS_SLOTS] {
        let mut present = [false; AXIS_SLOTS];
        if let Some(axes) = device.supported_absolute_axes() {
            for (slot, code) in AXIS_CODES.iter().enumerate() {
                present[slot] = axes.contains(*code);
            }
        }
        present
    }

    /// Checks for the gamepad signature: both stick axes plus BTN_SOUTH.
    fn is_gamepad(device: &Device) -> bool {
        let has_sticks = device
            .supported_absolute_axes()
            .map(|axes| {
                axes.contains(AbsoluteAxisType::ABS_X) && axes.contains(AbsoluteAxisType::ABS_Y)
            })
            .unwrap_or(false);

        let has_buttons = device
            .supported_keys()
            .map(|keys| keys.contains(Key::BTN_SOUTH))
            .unwrap_or(false);

        has_sticks && has_buttons
    }

    /// Get the device path of this controller
    #[must_use]
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Get the controller name from evdev
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.device.name()
    }

    /// Poll the current controller state
    ///
    /// Reads the absolute-axis and key state ioctls and normalizes each
    /// axis slot to [-1, 1] using the range the device reports. Axes the
    /// device does not expose read as 0.0.
    ///
    /// # Errors
    ///
    /// Returns [`RcBridgeError::Controller`] when the device has gone away;
    /// the caller should drop this handle and rediscover.
    pub fn poll(&mut self) -> Result<GamepadSnapshot> {
        let abs = self
            .device
            .get_abs_state()
            .map_err(|e| RcBridgeError::Controller(format!("Failed to read axis state: {}", e)))?;

        let keys = self
            .device
            .get_key_state()
            .map_err(|e| RcBridgeError::Controller(format!("Failed to read key state: {}", e)))?;

        let mut snapshot = GamepadSnapshot {
            present: self.present,
            ..GamepadSnapshot::default()
        };
        for (slot, code) in AXIS_CODES.iter().enumerate() {
            if !self.present[slot] {
                continue;
            }
            let info = abs[code.0 as usize];
            snapshot.axes[slot] = normalize_axis(info.value, info.minimum, info.maximum);
        }

        snapshot.btn_share = keys.contains(Key::BTN_SELECT);
        snapshot.btn_options = keys.contains(Key::BTN_START);

        Ok(snapshot)
    }
}

/// Normalizes a raw axis value into [-1, 1] given its reported range.
///
/// A degenerate range (max <= min, i.e. the axis is not really there)
/// normalizes to 0.0.
fn normalize_axis(value: i32, min: i32, max: i32) -> f32 {
    if max <= min {
        return 0.0;
    }

    let span = (max - min) as f32;
    let norm = (value - min) as f32 / span * 2.0 - 1.0;
    norm.clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_slot_layout() {
        assert_eq!(AXIS_CODES[AXIS_STEERING], AbsoluteAxisType::ABS_X);
        assert_eq!(AXIS_CODES[AXIS_HEAD_X], AbsoluteAxisType::ABS_Z);
        assert_eq!(AXIS_CODES[AXIS_HEAD_Y], AbsoluteAxisType::ABS_RZ);
        assert_eq!(AXIS_CODES[AXIS_THROTTLE], AbsoluteAxisType::ABS_RY);
    }

    #[test]
    fn test_normalize_full_range() {
        // DualSense-style 0..255 axes
        assert_eq!(normalize_axis(0, 0, 255), -1.0);
        assert_eq!(normalize_axis(255, 0, 255), 1.0);

        let center = normalize_axis(128, 0, 255);
        assert!(center.abs() < 0.01);
    }

    #[test]
    fn test_normalize_signed_range() {
        assert_eq!(normalize_axis(-32768, -32768, 32767), -1.0);
        assert_eq!(normalize_axis(32767, -32768, 32767), 1.0);
        assert!(normalize_axis(0, -32768, 32767).abs() < 0.001);
    }

    #[test]
    fn test_normalize_degenerate_range() {
        assert_eq!(normalize_axis(0, 0, 0), 0.0);
        assert_eq!(normalize_axis(5, 10, 10), 0.0);
        assert_eq!(normalize_axis(5, 10, 3), 0.0);
    }

    #[test]
    fn test_normalize_clamps_out_of_range_value() {
        // Devices occasionally report a value a step past the advertised max
        assert_eq!(normalize_axis(260, 0, 255), 1.0);
        assert_eq!(normalize_axis(-5, 0, 255), -1.0);
    }

    #[test]
    fn test_released_trigger_rescales_to_zero() {
        // Triggers rest at range minimum; (raw + 1) / 2 must give 0
        let raw = normalize_axis(0, 0, 255);
        assert_eq!((raw + 1.0) / 2.0, 0.0);
    }

    #[test]
    fn test_snapshot_axis_accessor() {
        let mut snapshot = GamepadSnapshot::default();
        snapshot.axes[AXIS_STEERING] = 0.5;

        assert_eq!(snapshot.axis(AXIS_STEERING), 0.5);
        assert_eq!(snapshot.axis(99), 0.0); // out-of-range slot reads neutral
    }

    #[test]
    fn test_snapshot_axis_presence() {
        let mut snapshot = GamepadSnapshot::default();
        assert!(!snapshot.has_axis(AXIS_THROTTLE));
        assert!(!snapshot.has_axis(99));

        snapshot.present[AXIS_THROTTLE] = true;
        assert!(snapshot.has_axis(AXIS_THROTTLE));
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore] // Run with: cargo test -- --ignored
    fn test_open_with_real_hardware() {
        let result = Gamepad::open();
        assert!(result.is_ok(), "Should detect a connected controller");

        let pad = result.unwrap();
        assert!(pad.device_path().starts_with("/dev/input/event"));
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore]
    fn test_poll_with_real_hardware() {
        let mut pad = Gamepad::open().expect("Controller not found");
        let snapshot = pad.poll().expect("Poll failed");

        for axis in snapshot.axes {
            assert!((-1.0..=1.0).contains(&axis));
        }
    }
}
