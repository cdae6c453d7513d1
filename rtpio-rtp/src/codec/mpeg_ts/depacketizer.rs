use bytes::Bytes;
use shared::error::{Error, Result};

use crate::codec::mpeg_ts::{TS_PACKET_SIZE, TS_SYNC_BYTE};
use crate::packet::Packet;
use crate::packetizer::Depacketizer;

/// Extracts transport stream packets from RTP packets (RFC 2250).
///
/// The payload must hold a whole number of 188-byte TS packets, each
/// starting with the sync byte.
#[derive(Debug, Default)]
pub struct MpegTsDepacketizer {}

impl MpegTsDepacketizer {
    pub fn new() -> Self {
        MpegTsDepacketizer::default()
    }
}

impl Depacketizer for MpegTsDepacketizer {
    fn depacketize(&mut self, pkt: &Packet) -> Result<Vec<Bytes>> {
        let payload = &pkt.payload;
        if payload.is_empty() || payload.len() % TS_PACKET_SIZE != 0 {
            return Err(Error::ErrNotMultipleOfTsPacket(payload.len()));
        }

        let mut ts_packets = Vec::with_capacity(payload.len() / TS_PACKET_SIZE);
        for pos in (0..payload.len()).step_by(TS_PACKET_SIZE) {
            if payload[pos] != TS_SYNC_BYTE {
                return Err(Error::ErrMissingTsSyncByte);
            }
            ts_packets.push(payload.slice(pos..pos + TS_PACKET_SIZE));
        }

        Ok(ts_packets)
    }
}
