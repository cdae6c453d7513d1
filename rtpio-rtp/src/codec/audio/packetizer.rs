use bytes::Bytes;
use shared::error::{Error, Result};

use crate::packet::Packet;
use crate::packetizer::{DEFAULT_PAYLOAD_MAX_SIZE, PacketFactory, Packetizer};

/// Emits one RTP packet per audio frame.
#[derive(Debug)]
pub struct SimpleAudioPacketizer {
    payload_max_size: usize,
    factory: PacketFactory,
}

impl SimpleAudioPacketizer {
    pub fn new(
        payload_type: u8,
        ssrc: Option<u32>,
        initial_sequence_number: Option<u16>,
        initial_timestamp: Option<u32>,
        payload_max_size: Option<usize>,
    ) -> Self {
        SimpleAudioPacketizer {
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

impl Packetizer for SimpleAudioPacketizer {
    fn packetize(&mut self, frames: &[Bytes], timestamp: u32) -> Result<Vec<Packet>> {
        if frames.is_empty() {
            return Err(Error::ErrPayloadTooSmall);
        }

        let mut packets = Vec::with_capacity(frames.len());
        for frame in frames {
            if frame.is_empty() {
                return Err(Error::ErrPayloadTooSmall);
            }
            if frame.len() > self.payload_max_size {
                return Err(Error::ErrPayloadTooBig);
            }
            packets.push(self.factory.new_packet(timestamp, true, frame.clone()));
        }

        Ok(packets)
    }
}
