use bytes::{BufMut, Bytes, BytesMut};
use media::ac3::SyncInfo;
use shared::error::{Error, Result};

use crate::codec::ac3::{
    FRAGMENT_TYPE_CONTINUATION, FRAGMENT_TYPE_INITIAL, FRAGMENT_TYPE_INITIAL_MOST,
};
use crate::packet::Packet;
use crate::packetizer::{DEFAULT_PAYLOAD_MAX_SIZE, PacketFactory, Packetizer};

/// Converts AC-3 frames into RTP packets (RFC 4184).
#[derive(Debug)]
pub struct Ac3Packetizer {
    payload_max_size: usize,
    factory: PacketFactory,
}

impl Ac3Packetizer {
    pub fn new(
        payload_type: u8,
        ssrc: Option<u32>,
        initial_sequence_number: Option<u16>,
        initial_timestamp: Option<u32>,
        payload_max_size: Option<usize>,
    ) -> Self {
        Ac3Packetizer {
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

    fn flush_batch(
        &mut self,
        packets: &mut Vec<Packet>,
        batch: &mut Vec<Bytes>,
        timestamp: u32,
    ) {
        if batch.is_empty() {
            return;
        }
        let mut payload =
            BytesMut::with_capacity(2 + batch.iter().map(Bytes::len).sum::<usize>());
        payload.put_u8(0);
        payload.put_u8(batch.len() as u8);
        for f in batch.drain(..) {
            payload.put_slice(&f);
        }
        packets.push(self.factory.new_packet(timestamp, false, payload.freeze()));
    }

    fn write_fragments(&mut self, packets: &mut Vec<Packet>, frame: &Bytes, timestamp: u32) {
        let avail = self.payload_max_size - 2;
        let count = frame.len().div_ceil(avail);

        for (i, chunk) in frame.chunks(avail).enumerate() {
            let fragment_type = if i == 0 {
                if count > 2 {
                    FRAGMENT_TYPE_INITIAL
                } else {
                    FRAGMENT_TYPE_INITIAL_MOST
                }
            } else {
                FRAGMENT_TYPE_CONTINUATION
            };

            let mut payload = BytesMut::with_capacity(2 + chunk.len());
            payload.put_u8(fragment_type);
            payload.put_u8(count as u8);
            payload.put_slice(chunk);
            packets.push(self.factory.new_packet(timestamp, false, payload.freeze()));
        }
    }
}

impl Packetizer for Ac3Packetizer {
    fn packetize(&mut self, frames: &[Bytes], timestamp: u32) -> Result<Vec<Packet>> {
        if frames.is_empty() {
            return Err(Error::ErrPayloadTooSmall);
        }

        let mut packets = Vec::new();
        let mut batch: Vec<Bytes> = Vec::new();
        let mut batch_size = 2usize;

        for frame in frames {
            // every unit must be a whole AC-3 frame
            let sync_info = SyncInfo::unmarshal(frame)?;
            if sync_info.frame_size() != frame.len() {
                return Err(Error::ErrInvalidAc3SyncInfo);
            }

            if 2 + frame.len() > self.payload_max_size {
                self.flush_batch(&mut packets, &mut batch, timestamp);
                batch_size = 2;
                self.write_fragments(&mut packets, frame, timestamp);
                continue;
            }

            if batch_size + frame.len() > self.payload_max_size {
                self.flush_batch(&mut packets, &mut batch, timestamp);
                batch_size = 2;
            }
            batch_size += frame.len();
            batch.push(frame.clone());
        }
        self.flush_batch(&mut packets, &mut batch, timestamp);

        if let Some(last) = packets.last_mut() {
            last.header.marker = true;
        }

        Ok(packets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ac3::Ac3Depacketizer;
    use crate::packetizer::Depacketizer;

    fn new_packetizer() -> Ac3Packetizer {
        Ac3Packetizer::new(97, Some(0x24681357), Some(80), Some(0), None)
    }

    /// 48 kHz, 448 kbit/s: 1792-byte frames, larger than one packet.
    fn big_frame() -> Bytes {
        let mut f = vec![0x0B, 0x77, 0x00, 0x00, 0x1E];
        f.extend(vec![0x77; 1792 - 5]);
        Bytes::from(f)
    }

    /// 48 kHz, 32 kbit/s: 128-byte frames.
    fn small_frame() -> Bytes {
        let mut f = vec![0x0B, 0x77, 0x00, 0x00, 0x00];
        f.extend(vec![0x33; 123]);
        Bytes::from(f)
    }

    #[test]
    fn test_packetize_aggregated() -> Result<()> {
        let mut p = new_packetizer();
        let packets = p.packetize(&[small_frame(), small_frame()], 0)?;

        assert_eq!(packets.len(), 1);
        assert_eq!(&packets[0].payload[..2], &[0x00, 0x02]);
        assert!(packets[0].header.marker);

        Ok(())
    }

    #[test]
    fn test_packetize_fragments_large_frame() -> Result<()> {
        let mut p = new_packetizer();
        let packets = p.packetize(&[big_frame()], 0)?;

        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].payload[0], FRAGMENT_TYPE_INITIAL_MOST);
        assert_eq!(packets[1].payload[0], FRAGMENT_TYPE_CONTINUATION);
        assert!(packets[1].header.marker);

        Ok(())
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        let mut p = new_packetizer();
        let mut d = Ac3Depacketizer::new();
        let frames = vec![small_frame(), small_frame(), big_frame()];

        let mut decoded = Vec::new();
        for pkt in p.packetize(&frames, 0)? {
            match d.depacketize(&pkt) {
                Ok(mut out) => decoded.append(&mut out),
                Err(e) if e.is_waiting() => {}
                Err(e) => return Err(e),
            }
        }
        assert_eq!(decoded, frames);

        Ok(())
    }
}
