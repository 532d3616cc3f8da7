//! # CRSF Frame Decoder
//!
//! Reference decoder for the RC channels frame.
//!
//! The bridge itself only transmits; this decoder exists so the bit packing
//! and checksum have a second implementation to agree with (round-trip
//! property) and for bench tools that want to inspect the wire traffic.

use super::checksum::additive_checksum;
use super::protocol::*;
use crate::error::{RcBridgeError, Result};

/// Decode a complete RC channels frame
///
/// Validates the address byte, length byte, frame type, and additive
/// checksum, then unpacks the 16 channel values.
///
/// # Arguments
///
/// * `frame` - Complete frame bytes (address, length, type, payload, checksum)
///
/// # Returns
///
/// * `Result<ChannelFrame>` - The 16 recovered channel values
///
/// # Errors
///
/// Returns [`RcBridgeError::Frame`] if:
/// - The frame is shorter than the fixed RC channels frame size
/// - The address or frame-type byte is wrong
/// - The length byte does not match the payload
/// - The checksum does not match
pub fn decode_rc_channels_frame(frame: &[u8]) -> Result<ChannelFrame> {
    if frame.len() < CRSF_RC_CHANNELS_FRAME_SIZE {
        return Err(RcBridgeError::Frame(format!(
            "frame too short: expected {} bytes, got {}",
            CRSF_RC_CHANNELS_FRAME_SIZE,
            frame.len()
        )));
    }

    if frame[0] != CRSF_ADDRESS {
        return Err(RcBridgeError::Frame(format!(
            "invalid address byte: 0x{:02X}",
            frame[0]
        )));
    }

    let length = frame[1] as usize;
    if length != CRSF_RC_CHANNELS_PAYLOAD_SIZE + 2 {
        return Err(RcBridgeError::Frame(format!(
            "invalid length byte: expected {}, got {}",
            CRSF_RC_CHANNELS_PAYLOAD_SIZE + 2,
            length
        )));
    }

    if frame[2] != CRSF_FRAMETYPE_RC_CHANNELS {
        return Err(RcBridgeError::Frame(format!(
            "unexpected frame type: 0x{:02X}",
            frame[2]
        )));
    }

    let payload = &frame[3..3 + CRSF_RC_CHANNELS_PAYLOAD_SIZE];
    let received_sum = frame[3 + CRSF_RC_CHANNELS_PAYLOAD_SIZE];
    let computed_sum = additive_checksum(&frame[2..3 + CRSF_RC_CHANNELS_PAYLOAD_SIZE]);

    if received_sum != computed_sum {
        return Err(RcBridgeError::Frame(format!(
            "checksum mismatch: expected 0x{:02X}, got 0x{:02X}",
            computed_sum, received_sum
        )));
    }

    Ok(unpack_rc_channels(payload))
}

/// Unpack 16 channels from the 22-byte payload
///
/// Inverse of the encoder's bit packing: reads 11 bits per channel from a
/// continuous LSB-first bitstream.
fn unpack_rc_channels(payload: &[u8]) -> ChannelFrame {
    let mut channels = [0u16; CRSF_NUM_CHANNELS];
    let mut acc: u32 = 0;
    let mut bits = 0;
    let mut idx = 0;

    for channel in channels.iter_mut() {
        while bits < CRSF_CHANNEL_BITS && idx < payload.len() {
            acc |= u32::from(payload[idx]) << bits;
            bits += 8;
            idx += 1;
        }
        *channel = (acc & 0x7FF) as u16;
        acc >>= CRSF_CHANNEL_BITS;
        bits = bits.saturating_sub(CRSF_CHANNEL_BITS);
    }

    channels
}
