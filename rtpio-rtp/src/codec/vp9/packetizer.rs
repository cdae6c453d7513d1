use bytes::{BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};

use crate::packet::Packet;
use crate::packetizer::{DEFAULT_PAYLOAD_MAX_SIZE, PacketFactory, Packetizer};

/// Converts VP9 frames into RTP packets (draft-ietf-payload-vp9).
///
/// Every packet carries a descriptor with a 15-bit picture id; the B and
/// E flags delimit the frame, the marker bit closes it.
#[derive(Debug)]
pub struct Vp9Packetizer {
    payload_max_size: usize,
    picture_id: u16,
    factory: PacketFactory,
}

impl Vp9Packetizer {
    pub fn new(
        payload_type: u8,
        ssrc: Option<u32>,
        initial_sequence_number: Option<u16>,
        initial_timestamp: Option<u32>,
        initial_picture_id: Option<u16>,
        payload_max_size: Option<usize>,
    ) -> Self {
        Vp9Packetizer {
            payload_max_size: payload_max_size.unwrap_or(DEFAULT_PAYLOAD_MAX_SIZE),
            picture_id: initial_picture_id.unwrap_or_else(|| rand::random::<u16>() & 0x7FFF),
            factory: PacketFactory::new(
                payload_type,
                ssrc,
                initial_sequence_number,
                initial_timestamp,
            ),
        }
    }

    pub fn ssrc(&self) -> u32 {
        self.factory.ssrc()
    }
}

impl Packetizer for Vp9Packetizer {
    /// A call carries exactly one frame; multiple frames mean multiple
    /// calls with their own timestamps.
    fn packetize(&mut self, frames: &[Bytes], timestamp: u32) -> Result<Vec<Packet>> {
        let [frame] = frames else {
            return Err(Error::ErrInvalidConfiguration(
                "one frame per call is required".into(),
            ));
        };
        if frame.is_empty() {
            return Err(Error::ErrPayloadTooSmall);
        }

        let avail = self.payload_max_size - 3;
        let count = frame.len().div_ceil(avail);
        let mut packets = Vec::with_capacity(count);

        for (i, chunk) in frame.chunks(avail).enumerate() {
            let mut header: u8 = 0b1000_0000; // picture id present
            if i == 0 {
                header |= 0b0000_1000; // begin frame
            }
            if i == count - 1 {
                header |= 0b0000_0100; // end frame
            }

            let mut payload = BytesMut::with_capacity(3 + chunk.len());
            payload.put_u8(header);
            payload.put_u8(0b1000_0000 | (self.picture_id >> 8) as u8);
            payload.put_u8(self.picture_id as u8);
            payload.put_slice(chunk);

            let marker = i == count - 1;
            packets.push(self.factory.new_packet(timestamp, marker, payload.freeze()));
        }

        self.picture_id = (self.picture_id + 1) & 0x7FFF;
        Ok(packets)
    }
}
