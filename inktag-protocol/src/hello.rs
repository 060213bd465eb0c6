//! Hello record, sent by the tag at the start of every sync round

use heapless::Vec;

use crate::wire::{Reader, WireError, Writer};
use crate::{MAP_BYTES, MAX_PACKET_LEN};

/// Encoded Hello length in bytes
pub const HELLO_LEN: usize = 4 + 4 + 4 + 4 + 2 + 2 + 4 + MAP_BYTES;

/// Tag state announcement
///
/// Tells the gateway who the tag is, how healthy its battery is, and which
/// chunks of which image it already holds.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hello {
    /// Hardware/board type
    pub tag_type: u32,
    /// Tag id, also the tag's radio address
    pub tag_id: u32,
    /// Short hash of the running firmware build
    pub firmware_hash: u32,
    /// Provisioning timestamp (UNIX seconds)
    pub install_time: u32,
    /// Battery voltage in millivolts
    pub battery_mv: u16,
    /// Id of the image the tag currently holds (0 = none)
    pub image_id: u32,
    /// Chunk map snapshot, `1` = chunk received
    pub chunk_map: [u8; MAP_BYTES],
}

impl Hello {
    /// Encode into `buf`, returning the number of bytes written
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        let mut w = Writer::new(buf, HELLO_LEN)?;
        w.u32(self.tag_type);
        w.u32(self.tag_id);
        w.u32(self.firmware_hash);
        w.u32(self.install_time);
        w.u16(self.battery_mv);
        w.u16(0); // reserved
        w.u32(self.image_id);
        w.bytes(&self.chunk_map);
        Ok(w.finish())
    }

    /// Encode into a heapless Vec sized for one packet
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_PACKET_LEN>, WireError> {
        let mut buffer = [0u8; HELLO_LEN];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| WireError::BufferTooSmall)
    }

    /// Decode a received Hello (gateway side, tests)
    pub fn decode(buf: &[u8]) -> Result<Self, WireError> {
        let mut r = Reader::new(buf, HELLO_LEN)?;
        let tag_type = r.u32();
        let tag_id = r.u32();
        let firmware_hash = r.u32();
        let install_time = r.u32();
        let battery_mv = r.u16();
        let _reserved = r.u16();
        let image_id = r.u32();
        let chunk_map = r.array();
        Ok(Self {
            tag_type,
            tag_id,
            firmware_hash,
            install_time,
            battery_mv,
            image_id,
            chunk_map,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Hello {
        let mut chunk_map = [0u8; MAP_BYTES];
        chunk_map[0] = 0b0000_0101;
        chunk_map[15] = 0x80;
        Hello {
            tag_type: 0x0000_0001,
            tag_id: 0x5012_3456,
            firmware_hash: 0xDEAD_BEEF,
            install_time: 1_700_000_000,
            battery_mv: 2950,
            image_id: 7,
            chunk_map,
        }
    }

    #[test]
    fn test_hello_length() {
        assert_eq!(HELLO_LEN, 40);
        let vec = sample().encode_to_vec().unwrap();
        assert_eq!(vec.len(), HELLO_LEN);
    }

    #[test]
    fn test_hello_field_offsets() {
        let mut buf = [0u8; HELLO_LEN];
        sample().encode(&mut buf).unwrap();

        assert_eq!(&buf[0..4], &1u32.to_le_bytes());
        assert_eq!(&buf[4..8], &0x5012_3456u32.to_le_bytes());
        assert_eq!(&buf[8..12], &0xDEAD_BEEFu32.to_le_bytes());
        assert_eq!(&buf[16..18], &2950u16.to_le_bytes());
        assert_eq!(&buf[18..20], &[0, 0]); // reserved
        assert_eq!(&buf[20..24], &7u32.to_le_bytes());
        assert_eq!(buf[24], 0b0000_0101);
        assert_eq!(buf[39], 0x80);
    }

    #[test]
    fn test_hello_decode_matches_encode() {
        let original = sample();
        let mut buf = [0u8; HELLO_LEN];
        original.encode(&mut buf).unwrap();
        assert_eq!(Hello::decode(&buf).unwrap(), original);
    }

    #[test]
    fn test_hello_buffer_too_small() {
        let mut buf = [0u8; HELLO_LEN - 1];
        assert_eq!(sample().encode(&mut buf), Err(WireError::BufferTooSmall));
        assert_eq!(Hello::decode(&buf), Err(WireError::Truncated));
    }
}
