//! # Channel Mapper Module
//!
//! Maps shaped/normalized control values into the link's channel range.
//!
//! ## Channel Assignments
//!
//! | Channel | Input | Domain |
//! |---------|---------------------|-------------|
//! | CH1 | Shaped steering | [-1, 1] |
//! | CH2 | Shaped throttle | [0, 1] |
//! | CH3 | Adjusted head yaw | [-180, 180] |
//! | CH4 | Adjusted head pitch | [-45, 45] |
//! | CH5 | Reverse trigger | [0, 1] |
//!
//! Channels not driven by a live input stay at the neutral value 1024.
//!
//! ## Value Ranges
//!
//! Mapped output defaults to [172, 1811], the link convention that leaves
//! headroom inside the 11-bit [0, 2047] domain. The mapper clamps its
//! result to the 11-bit domain so the frame encoder can assume valid input.

use crate::crsf::protocol::{
    channels, ChannelFrame, CRSF_CHANNEL_RANGE_HIGH, CRSF_CHANNEL_RANGE_LOW,
    CRSF_CHANNEL_VALUE_MAX, CRSF_CHANNEL_VALUE_NEUTRAL, CRSF_NUM_CHANNELS,
};

/// Linearly maps `x` from `[a1, a2]` into `[b1, b2]`, truncating toward zero.
///
/// The truncation (not rounding) direction is part of the wire contract:
/// `map_range(0.0, -1.0, 1.0, 172, 1811)` is exactly 991, never 992. The
/// result is clamped to the 11-bit channel domain, which bounds values whose
/// input fell outside `[a1, a2]`.
///
/// # Examples
///
/// ```
/// use rc_bridge::control::mapper::map_range;
///
/// assert_eq!(map_range(-1.0, -1.0, 1.0, 172, 1811), 172);
/// assert_eq!(map_range(1.0, -1.0, 1.0, 172, 1811), 1811);
/// assert_eq!(map_range(0.0, -1.0, 1.0, 172, 1811), 991);
/// ```
#[must_use]
pub fn map_range(x: f32, a1: f32, a2: f32, b1: u16, b2: u16) -> u16 {
    let out = f32::from(b1) + (x - a1) * f32::from(b2 - b1) / (a2 - a1);

    // `as` truncates toward zero; the clamp enforces the encoder's contract
    (out as i32).clamp(0, i32::from(CRSF_CHANNEL_VALUE_MAX)) as u16
}

/// A snapshot of the shaped pilot inputs for one tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct PilotInputs {
    /// Shaped steering, [-1, 1].
    pub steering: f32,
    /// Shaped throttle, [0, 1].
    pub throttle: f32,
    /// Adjusted head yaw, degrees.
    pub yaw: f32,
    /// Adjusted head pitch, degrees.
    pub pitch: f32,
    /// Rescaled reverse trigger, [0, 1].
    pub reverse_trigger: f32,
}

/// Maps pilot inputs to the 16-channel frame.
#[derive(Debug, Clone, Copy)]
pub struct ChannelMapper {
    /// Low end of the mapped channel range.
    low: u16,
    /// High end of the mapped channel range.
    high: u16,
    /// Reverse-indicator threshold on the rescaled trigger, (0, 1).
    reverse_threshold: f32,
}

impl Default for ChannelMapper {
    fn default() -> Self {
        Self::new(
            CRSF_CHANNEL_RANGE_LOW,
            CRSF_CHANNEL_RANGE_HIGH,
            0.5,
        )
    }
}

impl ChannelMapper {
    /// Creates a mapper with the given codomain bounds and reverse threshold.
    ///
    /// Bounds are validated by [`Config::validate`](crate::config::Config),
    /// which rejects `low >= high` and values outside the 11-bit domain
    /// before a mapper is built from them.
    #[must_use]
    pub fn new(low: u16, high: u16, reverse_threshold: f32) -> Self {
        Self {
            low,
            high,
            reverse_threshold,
        }
    }

    /// Builds the 16-channel frame for one tick.
    ///
    /// Driven channels get their mapped values; the rest stay neutral.
    ///
    /// # Examples
    ///
    /// ```
    /// use rc_bridge::control::mapper::{ChannelMapper, PilotInputs};
    ///
    /// let mapper = ChannelMapper::default();
    /// let frame = mapper.build(&PilotInputs::default());
    ///
    /// assert_eq!(frame[0], 991);  // steering centered
    /// assert_eq!(frame[1], 172);  // throttle at zero
    /// assert_eq!(frame[5], 1024); // undriven channel neutral
    /// ```
    #[must_use]
    pub fn build(&self, inputs: &PilotInputs) -> ChannelFrame {
        let mut frame = [CRSF_CHANNEL_VALUE_NEUTRAL; CRSF_NUM_CHANNELS];

        frame[channels::STEERING] = self.map(inputs.steering, -1.0, 1.0);
        frame[channels::THROTTLE] = self.map(inputs.throttle, 0.0, 1.0);
        frame[channels::YAW] = self.map(inputs.yaw, -180.0, 180.0);
        frame[channels::PITCH] = self.map(inputs.pitch, -45.0, 45.0);
        frame[channels::REVERSE] = self.map(inputs.reverse_trigger, 0.0, 1.0);

        frame
    }

    /// True when the rescaled reverse trigger is past the threshold.
    ///
    /// This drives the reverse status indicator only - it is not a protocol
    /// channel (the trigger's analog value goes out on CH5 regardless).
    #[must_use]
    pub fn reverse_active(&self, reverse_trigger: f32) -> bool {
        reverse_trigger > self.reverse_threshold
    }

    /// Maps one value from its natural domain into the configured codomain.
    #[inline]
    fn map(&self, value: f32, domain_min: f32, domain_max: f32) -> u16 {
        map_range(value, domain_min, domain_max, self.low, self.high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== map_range Tests ====================

    #[test]
    fn test_map_domain_boundaries() {
        assert_eq!(map_range(-1.0, -1.0, 1.0, 172, 1811), 172);
        assert_eq!(map_range(1.0, -1.0, 1.0, 172, 1811), 1811);
    }

    #[test]
    fn test_map_center_truncates_toward_zero() {
        // 172 + 1.0 * 1639 / 2 = 991.5, truncated to 991
        assert_eq!(map_range(0.0, -1.0, 1.0, 172, 1811), 991);
    }

    #[test]
    fn test_map_unit_domain() {
        assert_eq!(map_range(0.0, 0.0, 1.0, 172, 1811), 172);
        assert_eq!(map_range(1.0, 0.0, 1.0, 172, 1811), 1811);
    }

    #[test]
    fn test_map_degree_domains() {
        assert_eq!(map_range(0.0, -180.0, 180.0, 172, 1811), 991);
        assert_eq!(map_range(-45.0, -45.0, 45.0, 172, 1811), 172);
        assert_eq!(map_range(45.0, -45.0, 45.0, 172, 1811), 1811);
    }

    #[test]
    fn test_map_shaped_steering_first_tick() {
        // 172 + 1.2 * 1639 / 2 = 1155.4, truncated to 1155
        assert_eq!(map_range(0.2, -1.0, 1.0, 172, 1811), 1155);
    }

    #[test]
    fn test_map_clamps_out_of_domain_input() {
        assert_eq!(map_range(2.0, -1.0, 1.0, 172, 1811), 2047);
        assert_eq!(map_range(-3.0, -1.0, 1.0, 172, 1811), 0);
    }

    #[test]
    fn test_map_full_11_bit_codomain() {
        assert_eq!(map_range(-1.0, -1.0, 1.0, 0, 2047), 0);
        assert_eq!(map_range(1.0, -1.0, 1.0, 0, 2047), 2047);
    }

    // ==================== ChannelMapper Tests ====================

    #[test]
    fn test_neutral_inputs_frame() {
        let mapper = ChannelMapper::default();
        let frame = mapper.build(&PilotInputs::default());

        assert_eq!(frame[0], 991); // steering 0 in [-1, 1]
        assert_eq!(frame[1], 172); // throttle 0 in [0, 1]
        assert_eq!(frame[2], 991); // yaw 0 degrees
        assert_eq!(frame[3], 991); // pitch 0 degrees
        assert_eq!(frame[4], 172); // trigger released

        for ch in &frame[5..] {
            assert_eq!(*ch, 1024);
        }
    }

    #[test]
    fn test_full_deflection_frame() {
        let mapper = ChannelMapper::default();
        let frame = mapper.build(&PilotInputs {
            steering: 1.0,
            throttle: 1.0,
            yaw: 180.0,
            pitch: 45.0,
            reverse_trigger: 1.0,
        });

        assert_eq!(&frame[..5], &[1811, 1811, 1811, 1811, 1811]);
    }

    #[test]
    fn test_negative_deflection_frame() {
        let mapper = ChannelMapper::default();
        let frame = mapper.build(&PilotInputs {
            steering: -1.0,
            throttle: 0.0,
            yaw: -180.0,
            pitch: -45.0,
            reverse_trigger: 0.0,
        });

        assert_eq!(&frame[..5], &[172, 172, 172, 172, 172]);
    }

    #[test]
    fn test_custom_codomain() {
        let mapper = ChannelMapper::new(0, 2047, 0.5);
        let frame = mapper.build(&PilotInputs {
            steering: 1.0,
            ..PilotInputs::default()
        });

        assert_eq!(frame[0], 2047);
        assert_eq!(frame[1], 0);
    }

    #[test]
    fn test_frame_always_in_encoder_domain() {
        // Even wildly out-of-domain inputs must satisfy the encoder contract
        let mapper = ChannelMapper::default();
        let frame = mapper.build(&PilotInputs {
            steering: 100.0,
            throttle: -50.0,
            yaw: 1e6,
            pitch: -1e6,
            reverse_trigger: 9.0,
        });

        for ch in &frame {
            assert!(*ch <= 2047);
        }
    }

    // ==================== Reverse Indicator Tests ====================

    #[test]
    fn test_reverse_indicator_threshold() {
        let mapper = ChannelMapper::default();

        assert!(!mapper.reverse_active(0.0));
        assert!(!mapper.reverse_active(0.5)); // strictly greater-than
        assert!(mapper.reverse_active(0.51));
        assert!(mapper.reverse_active(1.0));
    }

    #[test]
    fn test_reverse_indicator_custom_threshold() {
        let mapper = ChannelMapper::new(172, 1811, 0.8);

        assert!(!mapper.reverse_active(0.7));
        assert!(mapper.reverse_active(0.81));
    }
}
