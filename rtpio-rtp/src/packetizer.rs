use bytes::Bytes;
use shared::error::Result;

use crate::header::Header;
use crate::packet::Packet;
use crate::sequence::Sequencer;

/// Default maximum payload size of an emitted packet: a 1500-byte MTU
/// minus IP (20), UDP (8) and RTP (12) headers.
pub const DEFAULT_PAYLOAD_MAX_SIZE: usize = 1460;

/// Splits groups of codec units (NALUs, access units, frames) into RTP
/// packets.
///
/// All units of one call share one RTP timestamp; the marker bit is set on
/// the last emitted packet of the group. Emitted payloads never exceed the
/// packetizer's payload size budget, and sequence numbers increase by one
/// per packet.
pub trait Packetizer {
    fn packetize(&mut self, units: &[Bytes], timestamp: u32) -> Result<Vec<Packet>>;
}

/// Reconstructs codec units from a stream of RTP packets.
///
/// A call can return zero or more units. Waiting conditions are reported
/// through [`shared::error::Error::is_waiting`] errors; fatal errors reset
/// any fragment state held by the depacketizer.
pub trait Depacketizer {
    fn depacketize(&mut self, pkt: &Packet) -> Result<Vec<Bytes>>;
}

/// Header state shared by every packetizer: payload type, SSRC, sequence
/// allocator and the random timestamp offset.
#[derive(Debug)]
pub(crate) struct PacketFactory {
    payload_type: u8,
    ssrc: u32,
    initial_timestamp: u32,
    sequencer: Sequencer,
}

impl PacketFactory {
    pub(crate) fn new(
        payload_type: u8,
        ssrc: Option<u32>,
        initial_sequence_number: Option<u16>,
        initial_timestamp: Option<u32>,
    ) -> Self {
        PacketFactory {
            payload_type,
            ssrc: ssrc.unwrap_or_else(rand::random::<u32>),
            initial_timestamp: initial_timestamp.unwrap_or_else(rand::random::<u32>),
            sequencer: match initial_sequence_number {
                Some(n) => Sequencer::new(n),
                None => Sequencer::new_random(),
            },
        }
    }

    pub(crate) fn ssrc(&self) -> u32 {
        self.ssrc
    }

    pub(crate) fn new_packet(&mut self, timestamp: u32, marker: bool, payload: Bytes) -> Packet {
        Packet {
            header: Header {
                marker,
                payload_type: self.payload_type,
                sequence_number: self.sequencer.next_sequence_number(),
                timestamp: self.initial_timestamp.wrapping_add(timestamp),
                ssrc: self.ssrc,
                ..Default::default()
            },
            payload,
            padding_size: 0,
        }
    }
}
