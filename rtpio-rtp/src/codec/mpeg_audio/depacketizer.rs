use bytes::{BufMut, Bytes, BytesMut};
use media::mpeg1audio::FrameHeader;
use shared::error::{Error, Result};

use crate::packet::Packet;
use crate::packetizer::Depacketizer;

/// Reconstructs MPEG-1/2 audio frames from RTP packets (RFC 2250).
///
/// Frame boundaries come from the MPEG audio frame headers themselves;
/// the 4-byte payload prefix carries a fragment offset for frames that
/// cross packet boundaries.
#[derive(Debug, Default)]
pub struct MpegAudioDepacketizer {
    first_packet_received: bool,
    fragments: Vec<Bytes>,
    fragments_size: usize,
    /// Declared length of the frame being reassembled.
    fragments_total: usize,
    fragments_next_seq: u16,
}

impl MpegAudioDepacketizer {
    pub fn new() -> Self {
        MpegAudioDepacketizer::default()
    }

    fn reset_fragments(&mut self) {
        self.fragments.clear();
        self.fragments_size = 0;
        self.fragments_total = 0;
    }

    fn decode_fragmented(&mut self, pkt: &Packet, offset: usize, data: Bytes) -> Result<Vec<Bytes>> {
        if self.fragments.is_empty() {
            return Err(Error::ErrUnexpectedFragment);
        }

        if pkt.header.sequence_number != self.fragments_next_seq {
            self.reset_fragments();
            return Err(Error::ErrRtpPacketMissing);
        }
        if offset != self.fragments_size {
            self.reset_fragments();
            return Err(Error::ErrFragmentOffsetMismatch);
        }

        self.fragments_size += data.len();
        if self.fragments_size > self.fragments_total {
            self.reset_fragments();
            return Err(Error::ErrFragmentOffsetMismatch);
        }
        self.fragments.push(data);

        if self.fragments_size < self.fragments_total {
            self.fragments_next_seq = pkt.header.sequence_number.wrapping_add(1);
            return Err(Error::ErrNeedMorePackets);
        }

        let mut frame = BytesMut::with_capacity(self.fragments_size);
        for frag in self.fragments.drain(..) {
            frame.put_slice(&frag);
        }
        self.reset_fragments();
        Ok(vec![frame.freeze()])
    }
}

impl Depacketizer for MpegAudioDepacketizer {
    fn depacketize(&mut self, pkt: &Packet) -> Result<Vec<Bytes>> {
        let was_first = !self.first_packet_received;
        self.first_packet_received = true;

        if pkt.payload.len() < 5 {
            return Err(Error::ErrPayloadTooSmall);
        }
        if pkt.payload[0] != 0 || pkt.payload[1] != 0 {
            return Err(Error::ErrMbzNotZero);
        }
        let offset = usize::from(u16::from_be_bytes([pkt.payload[2], pkt.payload[3]]));
        let data = pkt.payload.slice(4..);

        if offset != 0 {
            if was_first && self.fragments.is_empty() {
                return Err(Error::ErrNonStartingFragment);
            }
            return self.decode_fragmented(pkt, offset, data);
        }

        // a fresh frame start invalidates any half-reassembled frame
        self.reset_fragments();

        let mut frames = Vec::new();
        let mut pos = 0;
        while pos < data.len() {
            let rem = data.slice(pos..);
            let header = FrameHeader::unmarshal(&rem)?;
            let frame_len = header.frame_len();

            if rem.len() < frame_len {
                // the frame continues in following packets
                self.fragments_size = rem.len();
                self.fragments_total = frame_len;
                self.fragments.push(rem);
                self.fragments_next_seq = pkt.header.sequence_number.wrapping_add(1);
                if frames.is_empty() {
                    return Err(Error::ErrNeedMorePackets);
                }
                return Ok(frames);
            }

            frames.push(rem.slice(..frame_len));
            pos += frame_len;
        }

        Ok(frames)
    }
}
