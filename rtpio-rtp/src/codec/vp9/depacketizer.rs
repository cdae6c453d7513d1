use bytes::{BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};

use crate::codec::vp9::MAX_FRAME_SIZE;
use crate::codec::vp9::descriptor::Vp9Descriptor;
use crate::packet::Packet;
use crate::packetizer::Depacketizer;

/// Reconstructs VP9 frames from RTP packets (draft-ietf-payload-vp9).
///
/// Frame boundaries are driven by the B (begin) and E (end) descriptor
/// flags.
#[derive(Debug, Default)]
pub struct Vp9Depacketizer {
    first_packet_received: bool,
    fragments: Vec<Bytes>,
    fragments_size: usize,
}

impl Vp9Depacketizer {
    pub fn new() -> Self {
        Vp9Depacketizer::default()
    }

    fn reset_fragments(&mut self) {
        self.fragments.clear();
        self.fragments_size = 0;
    }
}

impl Depacketizer for Vp9Depacketizer {
    fn depacketize(&mut self, pkt: &Packet) -> Result<Vec<Bytes>> {
        let was_first = !self.first_packet_received;
        self.first_packet_received = true;

        let desc = Vp9Descriptor::unmarshal(&pkt.payload)?;
        let fragment = pkt.payload.slice(desc.header_size..);

        if desc.begin_frame {
            self.reset_fragments();
        } else if self.fragments.is_empty() {
            if was_first {
                return Err(Error::ErrNonStartingFragment);
            }
            return Err(Error::ErrUnexpectedFragment);
        }

        self.fragments_size += fragment.len();
        if self.fragments_size > MAX_FRAME_SIZE {
            let size = self.fragments_size;
            self.reset_fragments();
            return Err(Error::ErrFrameTooBig(size, MAX_FRAME_SIZE));
        }
        self.fragments.push(fragment);

        if !desc.end_frame {
            return Err(Error::ErrNeedMorePackets);
        }

        let mut frame = BytesMut::with_capacity(self.fragments_size);
        for frag in self.fragments.drain(..) {
            frame.put_slice(&frag);
        }
        self.fragments_size = 0;
        Ok(vec![frame.freeze()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Header;

    fn packet(payload: Vec<u8>, seq: u16, marker: bool) -> Packet {
        Packet {
            header: Header {
                payload_type: 96,
                sequence_number: seq,
                marker,
                ..Default::default()
            },
            payload: Bytes::from(payload),
            padding_size: 0,
        }
    }

    #[test]
    fn test_depacketize_single_packet_frame() -> Result<()> {
        let mut d = Vp9Depacketizer::new();
        let frames = d.depacketize(&packet(vec![0b0000_1100, 0xAA, 0xBB], 1, true))?;
        assert_eq!(frames, vec![Bytes::from_static(&[0xAA, 0xBB])]);

        Ok(())
    }

    #[test]
    fn test_depacketize_fragmented_frame() -> Result<()> {
        let mut d = Vp9Depacketizer::new();

        assert_eq!(
            d.depacketize(&packet(vec![0b0000_1000, 0x01, 0x02], 1, false)),
            Err(Error::ErrNeedMorePackets)
        );
        assert_eq!(
            d.depacketize(&packet(vec![0b0000_0000, 0x03], 2, false)),
            Err(Error::ErrNeedMorePackets)
        );
        let frames = d.depacketize(&packet(vec![0b0000_0100, 0x04], 3, true))?;

        assert_eq!(frames, vec![Bytes::from_static(&[0x01, 0x02, 0x03, 0x04])]);

        Ok(())
    }

    #[test]
    fn test_depacketize_non_starting_at_stream_start() {
        let mut d = Vp9Depacketizer::new();
        assert_eq!(
            d.depacketize(&packet(vec![0b0000_0000, 0x01], 1, false)),
            Err(Error::ErrNonStartingFragment)
        );
    }

    #[test]
    fn test_depacketize_non_starting_mid_stream() -> Result<()> {
        let mut d = Vp9Depacketizer::new();
        d.depacketize(&packet(vec![0b0000_1100, 0xAA], 1, true))?;
        assert_eq!(
            d.depacketize(&packet(vec![0b0000_0000, 0x01], 2, false)),
            Err(Error::ErrUnexpectedFragment)
        );

        Ok(())
    }

    #[test]
    fn test_depacketize_begin_resets_previous_fragments() -> Result<()> {
        let mut d = Vp9Depacketizer::new();
        d.depacketize(&packet(vec![0b0000_1000, 0x01], 1, false)).ok();
        // new begin flag discards the unfinished frame
        let frames = d.depacketize(&packet(vec![0b0000_1100, 0x09], 2, true))?;
        assert_eq!(frames, vec![Bytes::from_static(&[0x09])]);

        Ok(())
    }
}
