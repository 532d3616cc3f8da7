//! # Head Tracking Module
//!
//! Orientation input from either a serial head-tracking sensor or a
//! secondary pair of gamepad axes.
//!
//! ## Sensor text protocol
//!
//! Newline- or carriage-return-terminated ASCII lines of comma-separated
//! tokens. Recognized tokens are `YAW:<number>` and `PITCH:<number>`,
//! case- and whitespace-insensitive; other tokens are ignored. A malformed
//! numeric token skips that whole line. Example stream:
//!
//! ```text
//! YAW:12.5,PITCH:-3.0
//! seq:1042,YAW:13.0,PITCH:-2.8,temp:31
//! ```
//!
//! Bytes arrive in arbitrary chunks; an incomplete trailing line is kept in
//! the buffer until its terminator shows up on a later tick.
//!
//! ## Secondary gamepad axes
//!
//! The right stick doubles as a head source: each axis gets an independent
//! deadzone pass (no smoothing) and is scaled into degrees. The default
//! scales are -90 for yaw and -45 for pitch; the sign inversion depends on
//! how the sensor is mounted, so both scales are configuration, not code.

use crate::control::shaper::apply_deadzone;

/// A yaw/pitch update extracted from one sensor line.
///
/// Either field may be absent when the line only carried the other token.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HeadReading {
    pub yaw: Option<f32>,
    pub pitch: Option<f32>,
}

impl HeadReading {
    /// True when the line carried neither token.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.yaw.is_none() && self.pitch.is_none()
    }
}

/// Accumulates sensor bytes and yields parsed line readings.
///
/// Keeps the incomplete trailing fragment between ticks; everything else is
/// consumed as soon as its terminator arrives.
#[derive(Debug, Default)]
pub struct LineParser {
    buffer: String,
}

impl LineParser {
    /// Creates an empty parser.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears any buffered fragment, e.g. when the sensor link is replaced.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Feeds a chunk of raw bytes and returns the readings of every line
    /// completed by it.
    ///
    /// Non-UTF-8 bytes are replaced rather than treated as fatal; malformed
    /// lines produce no reading.
    ///
    /// # Examples
    ///
    /// ```
    /// use rc_bridge::input::head::LineParser;
    ///
    /// let mut parser = LineParser::new();
    ///
    /// // Terminator still missing: nothing yet
    /// assert!(parser.push_bytes(b"YAW:45.0,PIT").is_empty());
    ///
    /// let readings = parser.push_bytes(b"CH:-10.0\n");
    /// assert_eq!(readings[0].yaw, Some(45.0));
    /// assert_eq!(readings[0].pitch, Some(-10.0));
    /// ```
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<HeadReading> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));

        let mut readings = Vec::new();
        while let Some(pos) = self.buffer.find(['\n', '\r']) {
            let line: String = self.buffer.drain(..=pos).collect();
            if let Some(reading) = parse_line(line.trim_end_matches(['\n', '\r'])) {
                readings.push(reading);
            }
        }

        readings
    }
}

/// Parses one complete line into a reading.
///
/// Returns `None` for lines with a malformed numeric token (the whole line
/// is discarded, per the wire contract) and for lines carrying neither
/// recognized token.
fn parse_line(line: &str) -> Option<HeadReading> {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();

    let mut reading = HeadReading::default();
    for token in compact.split(',') {
        let upper = token.to_ascii_uppercase();
        if let Some(value) = upper.strip_prefix("YAW:") {
            reading.yaw = Some(value.parse().ok()?);
        } else if let Some(value) = upper.strip_prefix("PITCH:") {
            reading.pitch = Some(value.parse().ok()?);
        }
        // Unrecognized tokens are ignored
    }

    if reading.is_empty() {
        None
    } else {
        Some(reading)
    }
}

/// Derives a head pose from the secondary gamepad axes.
///
/// Each normalized axis gets an independent deadzone pass (no smoothing),
/// then is scaled into degrees. With the default scales of -90/-45 a stick
/// pushed fully right yields yaw -90.
///
/// # Examples
///
/// ```
/// use rc_bridge::input::head::secondary_axes_pose;
///
/// let (yaw, pitch) = secondary_axes_pose(1.0, -1.0, 0.05, -90.0, -45.0);
/// assert_eq!(yaw, -90.0);
/// assert_eq!(pitch, 45.0);
/// ```
#[must_use]
pub fn secondary_axes_pose(
    x: f32,
    y: f32,
    deadzone: f32,
    yaw_scale: f32,
    pitch_scale: f32,
) -> (f32, f32) {
    let yaw = apply_deadzone(x, deadzone) * yaw_scale;
    let pitch = apply_deadzone(y, deadzone) * pitch_scale;
    (yaw, pitch)
}
