use bytes::{BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};

use crate::codec::mpeg4_audio_latm::MAX_ACCESS_UNIT_SIZE;
use crate::packet::Packet;
use crate::packetizer::{DEFAULT_PAYLOAD_MAX_SIZE, PacketFactory, Packetizer};

/// Converts LATM AudioMuxElements into RTP packets
/// (RFC 6416 section 7.3).
#[derive(Debug)]
pub struct Mpeg4AudioLatmPacketizer {
    payload_max_size: usize,
    factory: PacketFactory,
}

impl Mpeg4AudioLatmPacketizer {
    pub fn new(
        payload_type: u8,
        ssrc: Option<u32>,
        initial_sequence_number: Option<u16>,
        initial_timestamp: Option<u32>,
        payload_max_size: Option<usize>,
    ) -> Self {
        Mpeg4AudioLatmPacketizer {
            payload_max_size: payload_max_size.unwrap_or(DEFAULT_PAYLOAD_MAX_SIZE),
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

impl Packetizer for Mpeg4AudioLatmPacketizer {
    fn packetize(&mut self, elements: &[Bytes], timestamp: u32) -> Result<Vec<Packet>> {
        if elements.is_empty() {
            return Err(Error::ErrPayloadTooSmall);
        }

        let mut packets = Vec::new();
        for element in elements {
            if element.is_empty() {
                return Err(Error::ErrPayloadTooSmall);
            }
            if element.len() > MAX_ACCESS_UNIT_SIZE {
                return Err(Error::ErrAccessUnitTooBig(
                    element.len(),
                    MAX_ACCESS_UNIT_SIZE,
                ));
            }

            // PayloadLengthInfo
            let mut body = BytesMut::with_capacity(element.len() + element.len() / 255 + 1);
            let mut remaining = element.len();
            while remaining >= 255 {
                body.put_u8(0xFF);
                remaining -= 255;
            }
            body.put_u8(remaining as u8);
            body.put_slice(element);
            let body = body.freeze();

            let count = body.len().div_ceil(self.payload_max_size);
            for (i, chunk) in body.chunks(self.payload_max_size).enumerate() {
                let marker = i == count - 1;
                packets.push(self.factory.new_packet(
                    timestamp,
                    marker,
                    Bytes::copy_from_slice(chunk),
                ));
            }
        }

        Ok(packets)
    }
}
