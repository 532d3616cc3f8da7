//! # CRSF Protocol Constants and Types
//!
//! Core definitions for the CRSF-style link frame this bridge transmits.
//!
//! The wire format is:
//!
//! ```text
//! [address][length][frame type][payload...][checksum]
//! ```
//!
//! where `length` counts every byte after the length field (frame type +
//! payload + checksum) and the checksum is the unsigned 8-bit sum of the
//! frame-type byte through the end of the payload. The RF module this was
//! written against validates exactly that layout; reproduce it bit-for-bit
//! if interoperating with real hardware.

/// CRSF device address byte (always 0xC8)
pub const CRSF_ADDRESS: u8 = 0xC8;

/// RC Channels frame type
pub const CRSF_FRAMETYPE_RC_CHANNELS: u8 = 0x16;

/// Number of RC channels per frame
pub const CRSF_NUM_CHANNELS: usize = 16;

/// Bits per channel value
pub const CRSF_CHANNEL_BITS: usize = 11;

/// RC channels payload size (16 channels x 11 bits = 176 bits = 22 bytes)
pub const CRSF_RC_CHANNELS_PAYLOAD_SIZE: usize = 22;

/// Complete RC channels frame size:
/// address(1) + length(1) + type(1) + payload(22) + checksum(1)
pub const CRSF_RC_CHANNELS_FRAME_SIZE: usize = CRSF_RC_CHANNELS_PAYLOAD_SIZE + 4;

/// Channel value range (11-bit: 0-2047)
pub const CRSF_CHANNEL_VALUE_MIN: u16 = 0;
pub const CRSF_CHANNEL_VALUE_MAX: u16 = 2047;

/// Neutral value for channels not driven by a live input
pub const CRSF_CHANNEL_VALUE_NEUTRAL: u16 = 1024;

/// Default low end of the mapped channel range.
///
/// The [172, 1811] convention leaves headroom below/above the 11-bit
/// extremes as an out-of-range safety margin.
pub const CRSF_CHANNEL_RANGE_LOW: u16 = 172;

/// Default high end of the mapped channel range.
pub const CRSF_CHANNEL_RANGE_HIGH: u16 = 1811;

/// RC channels array type (16 channels, 11-bit values)
pub type ChannelFrame = [u16; CRSF_NUM_CHANNELS];

/// Semantic channel indices.
pub mod channels {
    /// Steering - left stick X, domain [-1, 1]
    pub const STEERING: usize = 0;
    /// Throttle - R2 trigger, domain [0, 1]
    pub const THROTTLE: usize = 1;
    /// Adjusted head yaw, domain [-180, 180] degrees
    pub const YAW: usize = 2;
    /// Adjusted head pitch, domain [-45, 45] degrees
    pub const PITCH: usize = 3;
    /// Reverse trigger - L2, domain [0, 1]
    pub const REVERSE: usize = 4;
}
