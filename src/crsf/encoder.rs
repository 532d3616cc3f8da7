//! # CRSF Frame Encoder
//!
//! Encodes RC channels into CRSF-style link frames.

use super::checksum::additive_checksum;
use super::protocol::*;

/// Encode RC channels into a complete link frame
///
/// # Arguments
///
/// * `channels` - Array of 16 channel values (11-bit: 0-2047)
///
/// # Returns
///
/// * `Vec<u8>` - Complete frame
///   (26 bytes: address + length + type + 22-byte payload + checksum)
///
/// The length byte is `payload length + 2` and counts every byte after
/// itself; the checksum is the additive mod-256 sum of the frame-type byte
/// through the end of the payload.
///
/// Channel values above 2047 are a contract violation - the channel mapper
/// enforces bounds before this point. Violations trip a debug assertion and
/// are masked to 11 bits in release builds.
///
/// # Examples
///
/// ```
/// use rc_bridge::crsf::encoder::encode_rc_channels_frame;
///
/// let channels = [1024u16; 16]; // All channels neutral
/// let frame = encode_rc_channels_frame(&channels);
/// assert_eq!(frame.len(), 26);
/// assert_eq!(frame[0], 0xC8);
/// ```
pub fn encode_rc_channels_frame(channels: &ChannelFrame) -> Vec<u8> {
    let payload = encode_rc_channels_payload(channels);

    // Build frame: Address + Length + Type + Payload
    let mut frame = Vec::with_capacity(CRSF_RC_CHANNELS_FRAME_SIZE);
    frame.push(CRSF_ADDRESS);
    frame.push((payload.len() + 2) as u8);
    frame.push(CRSF_FRAMETYPE_RC_CHANNELS);
    frame.extend_from_slice(&payload);

    // Checksum covers frame type through payload (everything after length)
    let sum = additive_checksum(&frame[2..]);
    frame.push(sum);

    frame
}

/// Encode RC channels into the packed payload (22 bytes)
///
/// Packs 16 channels (11 bits each) into a continuous bitstream, LSB first,
/// emitting a byte as soon as 8 bits have accumulated. A trailing partial
/// byte is flushed zero-padded; for 16 channels the stream is an exact
/// multiple of 8 bits, so the flush only matters for the bit accounting.
///
/// # Arguments
///
/// * `channels` - Array of 16 channel values (11-bit: 0-2047)
///
/// # Returns
///
/// * `Vec<u8>` - 22-byte payload
///
/// # Algorithm
///
/// ```text
/// Byte 0: Ch1[0:7]
/// Byte 1: Ch2[0:4] | Ch1[8:10]
/// Byte 2: Ch3[0:1] | Ch2[5:10]
/// ...
/// ```
pub fn encode_rc_channels_payload(channels: &ChannelFrame) -> Vec<u8> {
    let mut payload = Vec::with_capacity(CRSF_RC_CHANNELS_PAYLOAD_SIZE);
    let mut acc: u32 = 0;
    let mut bits = 0;

    for &channel in channels.iter() {
        debug_assert!(
            channel <= CRSF_CHANNEL_VALUE_MAX,
            "channel value {} exceeds 11-bit range",
            channel
        );

        acc |= u32::from(channel & 0x7FF) << bits;
        bits += CRSF_CHANNEL_BITS;

        while bits >= 8 {
            payload.push((acc & 0xFF) as u8);
            acc >>= 8;
            bits -= 8;
        }
    }

    // Flush any remaining partial byte, zero-padded
    if bits > 0 {
        payload.push((acc & 0xFF) as u8);
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_length() {
        let channels = [CRSF_CHANNEL_VALUE_NEUTRAL; CRSF_NUM_CHANNELS];
        let frame = encode_rc_channels_frame(&channels);

        // address(1) + length(1) + type(1) + payload(22) + checksum(1)
        assert_eq!(frame.len(), 26);
    }

    #[test]
    fn test_frame_structure() {
        let channels = [CRSF_CHANNEL_VALUE_NEUTRAL; CRSF_NUM_CHANNELS];
        let frame = encode_rc_channels_frame(&channels);

        assert_eq!(frame[0], CRSF_ADDRESS);
        assert_eq!(frame[1], 24); // payload(22) + 2
        assert_eq!(frame[2], CRSF_FRAMETYPE_RC_CHANNELS);
    }

    #[test]
    fn test_checksum_covers_type_through_payload() {
        let channels = [CRSF_CHANNEL_VALUE_NEUTRAL; CRSF_NUM_CHANNELS];
        let frame = encode_rc_channels_frame(&channels);

        let expected = additive_checksum(&frame[2..frame.len() - 1]);
        assert_eq!(*frame.last().unwrap(), expected);
    }

    #[test]
    fn test_payload_length() {
        let channels = [0u16; CRSF_NUM_CHANNELS];
        let payload = encode_rc_channels_payload(&channels);

        assert_eq!(payload.len(), CRSF_RC_CHANNELS_PAYLOAD_SIZE);
    }

    #[test]
    fn test_payload_all_zeros() {
        let channels = [0u16; CRSF_NUM_CHANNELS];
        let payload = encode_rc_channels_payload(&channels);

        assert_eq!(payload, vec![0u8; 22]);
    }

    #[test]
    fn test_payload_all_max() {
        let channels = [CRSF_CHANNEL_VALUE_MAX; CRSF_NUM_CHANNELS];
        let payload = encode_rc_channels_payload(&channels);

        // 16 channels x 11 set bits = 176 set bits = 22 bytes of 0xFF
        assert_eq!(payload, vec![0xFFu8; 22]);
    }

    #[test]
    fn test_payload_single_channel_lsb_first() {
        let mut channels = [0u16; CRSF_NUM_CHANNELS];
        channels[0] = 0x7FF;

        let payload = encode_rc_channels_payload(&channels);

        // First 11 bits set: byte 0 = 0xFF, low 3 bits of byte 1
        assert_eq!(payload[0], 0xFF);
        assert_eq!(payload[1], 0x07);
        assert!(payload[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_payload_second_channel_offset() {
        let mut channels = [0u16; CRSF_NUM_CHANNELS];
        channels[1] = 1;

        let payload = encode_rc_channels_payload(&channels);

        // Channel 2 starts at bit 11, i.e. bit 3 of byte 1
        assert_eq!(payload[0], 0x00);
        assert_eq!(payload[1], 0x08);
    }

    #[test]
    fn test_payload_neutral_pattern() {
        // 1024 = 0b100_0000_0000: only the top bit of each 11-bit group set
        let channels = [CRSF_CHANNEL_VALUE_NEUTRAL; CRSF_NUM_CHANNELS];
        let payload = encode_rc_channels_payload(&channels);

        assert_eq!(payload[0], 0x00);
        assert_eq!(payload[1], 0x04); // bit 10 of channel 1
        assert_ne!(payload, vec![0u8; 22]);
        assert_ne!(payload, vec![0xFFu8; 22]);
    }

    #[test]
    fn test_release_builds_mask_to_11_bits() {
        // Contract violations are the mapper's bug; in release the encoder
        // still refuses to corrupt neighboring channels.
        let mut channels = [0u16; CRSF_NUM_CHANNELS];
        channels[0] = 0x800; // bit 11 set, 11-bit value 0

        if cfg!(not(debug_assertions)) {
            let payload = encode_rc_channels_payload(&channels);
            assert_eq!(payload, vec![0u8; 22]);
        }
    }

    #[test]
    fn test_different_channels_different_checksum() {
        let frame1 = encode_rc_channels_frame(&[1000u16; CRSF_NUM_CHANNELS]);
        let frame2 = encode_rc_channels_frame(&[1500u16; CRSF_NUM_CHANNELS]);

        assert_ne!(frame1.last(), frame2.last());
    }
}
