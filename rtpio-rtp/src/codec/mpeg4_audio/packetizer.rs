use bytes::{BufMut, Bytes, BytesMut};
use media::bits::BitWriter;
use shared::error::{Error, Result};

use crate::codec::mpeg4_audio::{DEFAULT_PAYLOAD_MAX_SIZE, MAX_ACCESS_UNIT_SIZE};
use crate::packet::Packet;
use crate::packetizer::{PacketFactory, Packetizer};

/// Converts MPEG-4 audio access units into RTP packets
/// (RFC 3640, AAC-hbr mode).
///
/// Small access units are aggregated, oversized ones are fragmented over
/// packets sharing one timestamp; the marker bit closes every aggregate
/// and every fragmented unit.
#[derive(Debug)]
pub struct Mpeg4AudioPacketizer {
    size_length: usize,
    index_length: usize,
    index_delta_length: usize,
    payload_max_size: usize,
    factory: PacketFactory,
}

impl Mpeg4AudioPacketizer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        payload_type: u8,
        size_length: usize,
        index_length: usize,
        index_delta_length: usize,
        ssrc: Option<u32>,
        initial_sequence_number: Option<u16>,
        initial_timestamp: Option<u32>,
        payload_max_size: Option<usize>,
    ) -> Self {
        Mpeg4AudioPacketizer {
            size_length,
            index_length,
            index_delta_length,
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

    /// AU headers section size in bytes for a batch of `n` units.
    fn headers_size(&self, n: usize) -> usize {
        let bits =
            self.size_length + self.index_length + (n - 1) * (self.size_length + self.index_delta_length);
        2 + bits.div_ceil(8)
    }

    fn write_aggregated(&mut self, packets: &mut Vec<Packet>, batch: &[Bytes], timestamp: u32) {
        let header_bits = self.size_length
            + self.index_length
            + (batch.len() - 1) * (self.size_length + self.index_delta_length);

        let mut w = BitWriter::new();
        for (i, au) in batch.iter().enumerate() {
            w.write_bits(au.len() as u64, self.size_length);
            let index_bits = if i == 0 {
                self.index_length
            } else {
                self.index_delta_length
            };
            w.write_bits(0, index_bits);
        }
        let headers = w.finish();

        let mut payload = BytesMut::with_capacity(
            2 + headers.len() + batch.iter().map(Bytes::len).sum::<usize>(),
        );
        payload.put_u16(header_bits as u16);
        payload.put_slice(&headers);
        for au in batch {
            payload.put_slice(au);
        }

        packets.push(self.factory.new_packet(timestamp, true, payload.freeze()));
    }

    fn write_fragmented(&mut self, packets: &mut Vec<Packet>, au: &Bytes, timestamp: u32) {
        let header_bits = self.size_length + self.index_length;
        let avail = self.payload_max_size - self.headers_size(1);
        let count = au.len().div_ceil(avail);

        for (i, chunk) in au.chunks(avail).enumerate() {
            let mut w = BitWriter::new();
            w.write_bits(au.len() as u64, self.size_length);
            w.write_bits(0, self.index_length);
            let headers = w.finish();

            let mut payload = BytesMut::with_capacity(2 + headers.len() + chunk.len());
            payload.put_u16(header_bits as u16);
            payload.put_slice(&headers);
            payload.put_slice(chunk);

            let marker = i == count - 1;
            packets.push(self.factory.new_packet(timestamp, marker, payload.freeze()));
        }
    }
}

impl Packetizer for Mpeg4AudioPacketizer {
    fn packetize(&mut self, aus: &[Bytes], timestamp: u32) -> Result<Vec<Packet>> {
        if aus.is_empty() {
            return Err(Error::ErrPayloadTooSmall);
        }

        let size_max = (1usize << self.size_length) - 1;
        for au in aus {
            if au.len() > MAX_ACCESS_UNIT_SIZE {
                return Err(Error::ErrAccessUnitTooBig(au.len(), MAX_ACCESS_UNIT_SIZE));
            }
            if au.len() > size_max {
                return Err(Error::ErrAccessUnitTooBig(au.len(), size_max));
            }
        }

        let mut packets = Vec::new();
        let mut batch: Vec<Bytes> = Vec::new();
        let mut batch_data = 0;

        for au in aus {
            if self.headers_size(1) + au.len() > self.payload_max_size {
                if !batch.is_empty() {
                    self.write_aggregated(&mut packets, &batch, timestamp);
                    batch.clear();
                    batch_data = 0;
                }
                self.write_fragmented(&mut packets, au, timestamp);
                continue;
            }

            if self.headers_size(batch.len() + 1) + batch_data + au.len() > self.payload_max_size
            {
                self.write_aggregated(&mut packets, &batch, timestamp);
                batch.clear();
                batch_data = 0;
            }
            batch_data += au.len();
            batch.push(au.clone());
        }
        if !batch.is_empty() {
            self.write_aggregated(&mut packets, &batch, timestamp);
        }

        Ok(packets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::mpeg4_audio::Mpeg4AudioDepacketizer;
    use crate::packetizer::Depacketizer;

    fn new_packetizer() -> Mpeg4AudioPacketizer {
        Mpeg4AudioPacketizer::new(96, 13, 3, 3, Some(0x44444444), Some(30), Some(0), None)
    }

    #[test]
    fn test_packetize_aggregated() -> Result<()> {
        let mut p = new_packetizer();
        let packets = p.packetize(
            &[
                Bytes::from_static(&[0x01, 0x02]),
                Bytes::from_static(&[0x03, 0x04]),
            ],
            0,
        )?;

        assert_eq!(packets.len(), 1);
        assert!(packets[0].header.marker);
        assert_eq!(
            packets[0].payload,
            Bytes::from_static(&[0x00, 0x20, 0x00, 0x10, 0x00, 0x10, 0x01, 0x02, 0x03, 0x04])
        );

        Ok(())
    }

    #[test]
    fn test_packetize_fragmented() -> Result<()> {
        let mut p = new_packetizer();
        let au = Bytes::from(vec![0x42; 3000]);
        let packets = p.packetize(&[au], 0)?;

        assert_eq!(packets.len(), 3);
        assert!(!packets[0].header.marker);
        assert!(!packets[1].header.marker);
        assert!(packets[2].header.marker);
        for pkt in &packets {
            assert!(pkt.payload.len() <= DEFAULT_PAYLOAD_MAX_SIZE);
            assert_eq!(pkt.header.timestamp, packets[0].header.timestamp);
        }

        Ok(())
    }

    #[test]
    fn test_packetize_au_over_size_field() {
        // 3-bit size field fits at most 7 bytes
        let mut p = Mpeg4AudioPacketizer::new(96, 3, 3, 3, Some(1), Some(0), Some(0), None);
        assert_eq!(
            p.packetize(&[Bytes::from(vec![0x00; 8])], 0),
            Err(Error::ErrAccessUnitTooBig(8, 7))
        );
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        let mut p = new_packetizer();
        let mut d = Mpeg4AudioDepacketizer::new(13, 3, 3);

        let aus = vec![
            Bytes::from(vec![0x10; 400]),
            Bytes::from(vec![0x20; 400]),
            Bytes::from(vec![0x30; 3000]),
        ];

        let mut decoded = Vec::new();
        for pkt in p.packetize(&aus, 0)? {
            match d.depacketize(&pkt) {
                Ok(mut out) => decoded.append(&mut out),
                Err(e) if e.is_waiting() => {}
                Err(e) => return Err(e),
            }
        }
        assert_eq!(decoded, aus);

        Ok(())
    }
}
