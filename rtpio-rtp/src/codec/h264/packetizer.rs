use bytes::{BufMut, Bytes, BytesMut};
use media::h264::{MAX_NALU_SIZE, NALU_TYPE_FU_A, NALU_TYPE_STAP_A};
use shared::error::{Error, Result};

use crate::packet::Packet;
use crate::packetizer::{DEFAULT_PAYLOAD_MAX_SIZE, PacketFactory, Packetizer};

/// Converts H.264 access units into RTP packets (RFC 6184).
///
/// NAL units that fit alone travel as single NAL unit packets, runs of
/// small NAL units are aggregated into STAP-A packets, and oversized NAL
/// units are split into FU-A fragments. The marker bit is set on the last
/// packet of each access unit.
#[derive(Debug)]
pub struct H264Packetizer {
    payload_max_size: usize,
    factory: PacketFactory,
}

impl H264Packetizer {
    pub fn new(
        payload_type: u8,
        ssrc: Option<u32>,
        initial_sequence_number: Option<u16>,
        initial_timestamp: Option<u32>,
        payload_max_size: Option<usize>,
    ) -> Self {
        H264Packetizer {
            payload_max_size: payload_max_size.unwrap_or(DEFAULT_PAYLOAD_MAX_SIZE),
            factory: PacketFactory::new(
                payload_type,
                ssrc,
                initial_sequence_number,
                initial_timestamp,
            ),
        }
    }

    /// SSRC carried by emitted packets.
    pub fn ssrc(&self) -> u32 {
        self.factory.ssrc()
    }

    fn flush_batch(
        &mut self,
        packets: &mut Vec<Packet>,
        batch: &mut Vec<Bytes>,
        timestamp: u32,
    ) {
        match batch.len() {
            0 => {}
            1 => {
                let nalu = batch.remove(0);
                packets.push(self.factory.new_packet(timestamp, false, nalu));
            }
            _ => {
                let mut payload =
                    BytesMut::with_capacity(1 + batch.iter().map(|n| 2 + n.len()).sum::<usize>());
                // STAP-A header: F and NRI from the first NAL unit
                payload.put_u8((batch[0][0] & 0b1110_0000) | NALU_TYPE_STAP_A);
                for nalu in batch.drain(..) {
                    payload.put_u16(nalu.len() as u16);
                    payload.put_slice(&nalu);
                }
                packets.push(self.factory.new_packet(timestamp, false, payload.freeze()));
            }
        }
    }

    fn write_fragments(&mut self, packets: &mut Vec<Packet>, nalu: &Bytes, timestamp: u32) {
        let indicator = (nalu[0] & 0b1110_0000) | NALU_TYPE_FU_A;
        let nalu_type = nalu[0] & 0b0001_1111;
        let body = &nalu[1..];

        let avail = self.payload_max_size - 2;
        let count = body.len().div_ceil(avail);

        for (i, chunk) in body.chunks(avail).enumerate() {
            let mut payload = BytesMut::with_capacity(2 + chunk.len());
            payload.put_u8(indicator);
            let mut fu_header = nalu_type;
            if i == 0 {
                fu_header |= 0b1000_0000; // start
            }
            if i == count - 1 {
                fu_header |= 0b0100_0000; // end
            }
            payload.put_u8(fu_header);
            payload.put_slice(chunk);
            packets.push(self.factory.new_packet(timestamp, false, payload.freeze()));
        }
    }
}

impl Packetizer for H264Packetizer {
    fn packetize(&mut self, nalus: &[Bytes], timestamp: u32) -> Result<Vec<Packet>> {
        let mut packets = Vec::new();
        let mut batch: Vec<Bytes> = Vec::new();
        let mut batch_size = 1; // STAP-A header byte

        for nalu in nalus {
            if nalu.is_empty() {
                return Err(Error::ErrEmptyNalu);
            }
            if nalu.len() > MAX_NALU_SIZE {
                return Err(Error::ErrNaluTooBig(nalu.len(), MAX_NALU_SIZE));
            }

            if nalu.len() > self.payload_max_size {
                self.flush_batch(&mut packets, &mut batch, timestamp);
                batch_size = 1;
                self.write_fragments(&mut packets, nalu, timestamp);
                continue;
            }

            if batch_size + 2 + nalu.len() > self.payload_max_size {
                self.flush_batch(&mut packets, &mut batch, timestamp);
                batch_size = 1;
            }
            batch_size += 2 + nalu.len();
            batch.push(nalu.clone());
        }
        self.flush_batch(&mut packets, &mut batch, timestamp);

        match packets.last_mut() {
            Some(last) => last.header.marker = true,
            None => return Err(Error::ErrEmptyNalu),
        }

        Ok(packets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_packetizer() -> H264Packetizer {
        H264Packetizer::new(96, Some(0x11223344), Some(100), Some(0), None)
    }

    #[test]
    fn test_packetize_stap_a() -> Result<()> {
        let mut p = new_packetizer();
        let packets = p.packetize(
            &[
                Bytes::from_static(&[0x07, 0x07]),
                Bytes::from_static(&[0x08, 0x08]),
                Bytes::from_static(&[0x09, 0x09]),
            ],
            0,
        )?;

        assert_eq!(packets.len(), 1);
        assert_eq!(
            packets[0].payload,
            Bytes::from_static(&[
                0x18, 0x00, 0x02, 0x07, 0x07, 0x00, 0x02, 0x08, 0x08, 0x00, 0x02, 0x09, 0x09,
            ])
        );
        assert!(packets[0].header.marker);
        assert_eq!(packets[0].header.sequence_number, 100);
        assert_eq!(packets[0].header.timestamp, 0);
        assert_eq!(packets[0].header.ssrc, 0x11223344);

        Ok(())
    }

    #[test]
    fn test_packetize_single() -> Result<()> {
        let mut p = new_packetizer();
        let nalu = Bytes::from(vec![0x65; 1000]);
        let packets = p.packetize(&[nalu.clone()], 3000)?;

        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].payload, nalu);
        assert!(packets[0].header.marker);
        assert_eq!(packets[0].header.timestamp, 3000);

        Ok(())
    }

    #[test]
    fn test_packetize_fu_a() -> Result<()> {
        let mut p = new_packetizer();
        let mut nalu = vec![0x63];
        for _ in 0..1024 {
            nalu.extend_from_slice(&[0x01, 0x02, 0x03, 0x04]);
        }
        let packets = p.packetize(&[Bytes::from(nalu)], 0)?;

        // 4096 bytes of body over 1458-byte chunks
        assert_eq!(packets.len(), 3);
        assert_eq!(&packets[0].payload[..2], &[0x7C, 0x83]);
        assert_eq!(&packets[1].payload[..2], &[0x7C, 0x03]);
        assert_eq!(&packets[2].payload[..2], &[0x7C, 0x43]);
        assert!(!packets[0].header.marker);
        assert!(!packets[1].header.marker);
        assert!(packets[2].header.marker);
        assert_eq!(packets[0].payload.len(), 1460);
        assert_eq!(packets[1].payload.len(), 1460);
        assert_eq!(packets[2].payload.len(), 2 + 4096 - 2 * 1458);

        // consecutive sequence numbers
        assert_eq!(packets[0].header.sequence_number, 100);
        assert_eq!(packets[1].header.sequence_number, 101);
        assert_eq!(packets[2].header.sequence_number, 102);

        Ok(())
    }

    #[test]
    fn test_packetize_respects_payload_max_size() -> Result<()> {
        let mut p = new_packetizer();
        let nalus: Vec<Bytes> = (0..40).map(|_| Bytes::from(vec![0x41; 100])).collect();
        let packets = p.packetize(&nalus, 0)?;

        assert!(packets.len() > 1);
        for pkt in &packets {
            assert!(pkt.payload.len() <= DEFAULT_PAYLOAD_MAX_SIZE);
        }
        assert!(packets.iter().filter(|p| p.header.marker).count() == 1);
        assert!(packets.last().unwrap().header.marker);

        Ok(())
    }

    #[test]
    fn test_packetize_empty_input() {
        let mut p = new_packetizer();
        assert!(p.packetize(&[], 0).is_err());
    }
}
