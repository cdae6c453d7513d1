use log::debug;
use rtp::codec::h264::{H264Depacketizer, H264Packetizer};
use rtp::packet::Packet;
use rtp::packetizer::{DEFAULT_PAYLOAD_MAX_SIZE, Depacketizer, Packetizer};
use shared::error::Result;

/// Preprocesses inbound RTP packets before they reach the reorderer.
///
/// Padding is always stripped. For H.264 over interleaved transports,
/// some cameras send packets well above the UDP MTU; those are split
/// into FU-A fragments so that downstream consumers never see an
/// oversized packet. Once splitting starts, every following packet is
/// re-packetized to keep sequence numbers contiguous.
#[derive(Debug)]
pub struct Cleaner {
    h264: bool,
    payload_max_size: usize,
    repacketizer: Option<(H264Depacketizer, H264Packetizer)>,
}

impl Cleaner {
    pub fn new(h264: bool, payload_max_size: Option<usize>) -> Self {
        Cleaner {
            h264,
            payload_max_size: payload_max_size.unwrap_or(DEFAULT_PAYLOAD_MAX_SIZE),
            repacketizer: None,
        }
    }

    pub fn process(&mut self, mut pkt: Packet) -> Result<Vec<Packet>> {
        pkt.strip_padding();

        if !self.h264 {
            return Ok(vec![pkt]);
        }

        if self.repacketizer.is_none() && pkt.payload.len() > self.payload_max_size {
            debug!(
                "{}-byte packet exceeds the payload budget, re-packetizing the stream",
                pkt.payload.len()
            );
            // seed the new stream with the original header fields so that
            // downstream bookkeeping sees a seamless continuation
            self.repacketizer = Some((
                H264Depacketizer::new(),
                H264Packetizer::new(
                    pkt.header.payload_type,
                    Some(pkt.header.ssrc),
                    Some(pkt.header.sequence_number),
                    Some(0),
                    Some(self.payload_max_size),
                ),
            ));
        }

        let Some((depacketizer, packetizer)) = self.repacketizer.as_mut() else {
            return Ok(vec![pkt]);
        };

        let nalus = match depacketizer.depacketize(&pkt) {
            Ok(nalus) => nalus,
            Err(e) if e.is_waiting() => return Ok(vec![]),
            Err(e) => return Err(e),
        };

        let mut packets = packetizer.packetize(&nalus, pkt.header.timestamp)?;
        if let Some(last) = packets.last_mut() {
            last.header.marker = pkt.header.marker;
        }
        Ok(packets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use rtp::header::Header;

    fn packet(payload: Vec<u8>, seq: u16, marker: bool) -> Packet {
        Packet {
            header: Header {
                payload_type: 96,
                sequence_number: seq,
                timestamp: 0x100,
                ssrc: 0xABCD_EF01,
                marker,
                ..Default::default()
            },
            payload: Bytes::from(payload),
            padding_size: 0,
        }
    }

    #[test]
    fn test_strips_padding() -> Result<()> {
        let mut c = Cleaner::new(false, None);
        let mut pkt = packet(vec![0x65, 0xAA], 1, true);
        pkt.header.padding = true;
        pkt.padding_size = 4;

        let out = c.process(pkt)?;
        assert_eq!(out.len(), 1);
        assert!(!out[0].header.padding);
        assert_eq!(out[0].padding_size, 0);

        Ok(())
    }

    #[test]
    fn test_small_h264_packet_untouched() -> Result<()> {
        let mut c = Cleaner::new(true, None);
        let pkt = packet(vec![0x65, 0xAA, 0xBB], 7, true);

        let out = c.process(pkt.clone())?;
        assert_eq!(out, vec![pkt]);

        Ok(())
    }

    #[test]
    fn test_oversized_h264_packet_is_split() -> Result<()> {
        let mut c = Cleaner::new(true, None);
        let mut nalu = vec![0x65];
        nalu.extend(vec![0x42; 3000]);

        let out = c.process(packet(nalu, 100, true))?;
        assert_eq!(out.len(), 3);
        for p in &out {
            assert!(p.payload.len() <= DEFAULT_PAYLOAD_MAX_SIZE);
            assert_eq!(p.header.ssrc, 0xABCD_EF01);
            assert_eq!(p.header.timestamp, 0x100);
        }
        // sequence numbering continues from the replaced packet
        assert_eq!(out[0].header.sequence_number, 100);
        assert_eq!(out[1].header.sequence_number, 101);
        assert_eq!(out[2].header.sequence_number, 102);
        assert!(out[2].header.marker);

        Ok(())
    }

    #[test]
    fn test_following_packets_are_repacketized_too() -> Result<()> {
        let mut c = Cleaner::new(true, None);
        let mut nalu = vec![0x65];
        nalu.extend(vec![0x42; 3000]);
        c.process(packet(nalu, 100, true))?;

        let out = c.process(packet(vec![0x41, 0x11, 0x22], 101, true))?;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].header.sequence_number, 103);
        assert_eq!(out[0].payload, Bytes::from_static(&[0x41, 0x11, 0x22]));

        Ok(())
    }
}
