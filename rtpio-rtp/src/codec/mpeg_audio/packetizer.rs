use bytes::{BufMut, Bytes, BytesMut};
use media::mpeg1audio::FrameHeader;
use shared::error::{Error, Result};

use crate::codec::mpeg_audio::PAYLOAD_TYPE;
use crate::packet::Packet;
use crate::packetizer::{DEFAULT_PAYLOAD_MAX_SIZE, PacketFactory, Packetizer};

/// Converts MPEG-1/2 audio frames into RTP packets (RFC 2250).
///
/// Whole frames are concatenated into packets with fragment offset zero;
/// frames exceeding the payload budget are split with explicit offsets.
#[derive(Debug)]
pub struct MpegAudioPacketizer {
    payload_max_size: usize,
    factory: PacketFactory,
}

impl MpegAudioPacketizer {
    pub fn new(
        ssrc: Option<u32>,
        initial_sequence_number: Option<u16>,
        initial_timestamp: Option<u32>,
        payload_max_size: Option<usize>,
    ) -> Self {
        MpegAudioPacketizer {
            payload_max_size: payload_max_size.unwrap_or(DEFAULT_PAYLOAD_MAX_SIZE),
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
            BytesMut::with_capacity(4 + batch.iter().map(Bytes::len).sum::<usize>());
        payload.put_u32(0); // MBZ and fragment offset
        for f in batch.drain(..) {
            payload.put_slice(&f);
        }
        packets.push(self.factory.new_packet(timestamp, false, payload.freeze()));
    }

    fn write_fragments(&mut self, packets: &mut Vec<Packet>, frame: &Bytes, timestamp: u32) {
        let avail = self.payload_max_size - 4;
        let mut offset = 0usize;

        for chunk in frame.chunks(avail) {
            let mut payload = BytesMut::with_capacity(4 + chunk.len());
            payload.put_u16(0);
            payload.put_u16(offset as u16);
            payload.put_slice(chunk);
            packets.push(self.factory.new_packet(timestamp, false, payload.freeze()));
            offset += chunk.len();
        }
    }
}

impl Packetizer for MpegAudioPacketizer {
    fn packetize(&mut self, frames: &[Bytes], timestamp: u32) -> Result<Vec<Packet>> {
        if frames.is_empty() {
            return Err(Error::ErrPayloadTooSmall);
        }

        let mut packets = Vec::new();
        let mut batch: Vec<Bytes> = Vec::new();
        let mut batch_size = 4usize;

        for frame in frames {
            // every unit must be a whole MPEG audio frame
            let header = FrameHeader::unmarshal(frame)?;
            if header.frame_len() != frame.len() {
                return Err(Error::ErrInvalidMpegAudioHeader);
            }

            if 4 + frame.len() > self.payload_max_size {
                self.flush_batch(&mut packets, &mut batch, timestamp);
                batch_size = 4;
                self.write_fragments(&mut packets, frame, timestamp);
                continue;
            }

            if batch_size + frame.len() > self.payload_max_size {
                self.flush_batch(&mut packets, &mut batch, timestamp);
                batch_size = 4;
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
    use crate::codec::mpeg_audio::MpegAudioDepacketizer;
    use crate::packetizer::Depacketizer;

    fn new_packetizer() -> MpegAudioPacketizer {
        MpegAudioPacketizer::new(Some(0x13579BDF), Some(60), Some(0), None)
    }

    /// MPEG-1 layer III, 128 kbps, 44100 Hz: 417-byte frames.
    fn frame() -> Bytes {
        let mut f = vec![0xFF, 0xFA, 0x90, 0x00];
        f.extend(vec![0x55; 413]);
        Bytes::from(f)
    }

    #[test]
    fn test_packetize_aggregates_frames() -> Result<()> {
        let mut p = new_packetizer();
        let packets = p.packetize(&[frame(), frame(), frame()], 0)?;

        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].header.payload_type, 14);
        assert_eq!(&packets[0].payload[..4], &[0, 0, 0, 0]);
        assert_eq!(packets[0].payload.len(), 4 + 3 * 417);

        Ok(())
    }

    #[test]
    fn test_packetize_rejects_garbage() {
        let mut p = new_packetizer();
        assert!(p.packetize(&[Bytes::from_static(&[1, 2, 3, 4])], 0).is_err());
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        let mut p = new_packetizer();
        let mut d = MpegAudioDepacketizer::new();
        let frames = vec![frame(), frame(), frame(), frame(), frame()];

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
