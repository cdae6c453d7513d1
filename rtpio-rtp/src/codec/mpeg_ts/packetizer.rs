use bytes::{BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};

use crate::codec::mpeg_ts::{
    DEFAULT_PAYLOAD_MAX_SIZE, PAYLOAD_TYPE, TS_PACKET_SIZE, TS_SYNC_BYTE,
};
use crate::packet::Packet;
use crate::packetizer::{PacketFactory, Packetizer};

/// Groups transport stream packets into RTP packets (RFC 2250).
///
/// TS streams carry no frame boundaries, so the marker bit is never set.
#[derive(Debug)]
pub struct MpegTsPacketizer {
    ts_packets_per_rtp: usize,
    factory: PacketFactory,
}

impl MpegTsPacketizer {
    pub fn new(
        ssrc: Option<u32>,
        initial_sequence_number: Option<u16>,
        initial_timestamp: Option<u32>,
        payload_max_size: Option<usize>,
    ) -> Self {
        let payload_max_size = payload_max_size.unwrap_or(DEFAULT_PAYLOAD_MAX_SIZE);
        MpegTsPacketizer {
            ts_packets_per_rtp: (payload_max_size / TS_PACKET_SIZE).max(1),
            factory: PacketFactory::new(
                PAYLOAD_TYPE,
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

impl Packetizer for MpegTsPacketizer {
    fn packetize(&mut self, ts_packets: &[Bytes], timestamp: u32) -> Result<Vec<Packet>> {
        if ts_packets.is_empty() {
            return Err(Error::ErrPayloadTooSmall);
        }
        for ts_packet in ts_packets {
            if ts_packet.len() != TS_PACKET_SIZE {
                return Err(Error::ErrNotMultipleOfTsPacket(ts_packet.len()));
            }
            if ts_packet[0] != TS_SYNC_BYTE {
                return Err(Error::ErrMissingTsSyncByte);
            }
        }

        let mut packets = Vec::with_capacity(ts_packets.len().div_ceil(self.ts_packets_per_rtp));
        for group in ts_packets.chunks(self.ts_packets_per_rtp) {
            let mut payload = BytesMut::with_capacity(group.len() * TS_PACKET_SIZE);
            for ts_packet in group {
                payload.put_slice(ts_packet);
            }
            packets.push(self.factory.new_packet(timestamp, false, payload.freeze()));
        }

        Ok(packets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::mpeg_ts::MpegTsDepacketizer;
    use crate::packetizer::Depacketizer;

    fn ts_packet(fill: u8) -> Bytes {
        let mut p = vec![TS_SYNC_BYTE];
        p.extend(vec![fill; TS_PACKET_SIZE - 1]);
        Bytes::from(p)
    }

    #[test]
    fn test_packetize_groups_of_seven() -> Result<()> {
        let mut p = MpegTsPacketizer::new(Some(0x600D600D), Some(90), Some(0), None);
        let ts: Vec<Bytes> = (0..9).map(|i| ts_packet(i)).collect();
        let packets = p.packetize(&ts, 0)?;

        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].payload.len(), 7 * TS_PACKET_SIZE);
        assert_eq!(packets[1].payload.len(), 2 * TS_PACKET_SIZE);
        assert_eq!(packets[0].header.payload_type, 33);
        assert!(!packets[0].header.marker);
        assert!(!packets[1].header.marker);

        Ok(())
    }

    #[test]
    fn test_packetize_rejects_odd_sizes() {
        let mut p = MpegTsPacketizer::new(Some(1), Some(0), Some(0), None);
        assert_eq!(
            p.packetize(&[Bytes::from_static(&[TS_SYNC_BYTE; 100])], 0),
            Err(Error::ErrNotMultipleOfTsPacket(100))
        );
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        let mut p = MpegTsPacketizer::new(Some(1), Some(0), Some(0), None);
        let mut d = MpegTsDepacketizer::new();
        let ts: Vec<Bytes> = (0..20).map(|i| ts_packet(i)).collect();

        let mut decoded = Vec::new();
        for pkt in p.packetize(&ts, 0)? {
            decoded.append(&mut d.depacketize(&pkt)?);
        }
        assert_eq!(decoded, ts);

        Ok(())
    }
}
