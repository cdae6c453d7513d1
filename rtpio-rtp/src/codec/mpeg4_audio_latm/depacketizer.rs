use bytes::{BufMut, Bytes, BytesMut};
use shared::error::{Error, Result};

use crate::codec::mpeg4_audio_latm::MAX_ACCESS_UNIT_SIZE;
use crate::packet::Packet;
use crate::packetizer::Depacketizer;

/// Reconstructs LATM AudioMuxElements from RTP packets
/// (RFC 6416 section 7.3).
#[derive(Debug, Default)]
pub struct Mpeg4AudioLatmDepacketizer {
    fragments: Vec<Bytes>,
    fragments_size: usize,
    /// Bytes of the AudioMuxElement still missing.
    pending: usize,
    fragments_next_seq: u16,
}

impl Mpeg4AudioLatmDepacketizer {
    pub fn new() -> Self {
        Mpeg4AudioLatmDepacketizer::default()
    }

    fn reset_fragments(&mut self) {
        self.fragments.clear();
        self.fragments_size = 0;
        self.pending = 0;
    }

    fn join(&mut self) -> Bytes {
        let mut element = BytesMut::with_capacity(self.fragments_size);
        for frag in self.fragments.drain(..) {
            element.put_slice(&frag);
        }
        self.fragments_size = 0;
        element.freeze()
    }

    fn decode_fragmented(&mut self, pkt: &Packet) -> Result<Vec<Bytes>> {
        if pkt.header.sequence_number != self.fragments_next_seq {
            self.reset_fragments();
            return Err(Error::ErrRtpPacketMissing);
        }

        if pkt.payload.len() < self.pending {
            self.fragments.push(pkt.payload.clone());
            self.fragments_size += pkt.payload.len();
            self.pending -= pkt.payload.len();
            self.fragments_next_seq = pkt.header.sequence_number.wrapping_add(1);
            return Err(Error::ErrNeedMorePackets);
        }

        // bytes past the element are otherData, dropped
        let take = self.pending;
        self.fragments.push(pkt.payload.slice(..take));
        self.fragments_size += take;
        self.pending = 0;
        Ok(vec![self.join()])
    }
}

impl Depacketizer for Mpeg4AudioLatmDepacketizer {
    fn depacketize(&mut self, pkt: &Packet) -> Result<Vec<Bytes>> {
        if self.pending > 0 {
            return self.decode_fragmented(pkt);
        }

        // PayloadLengthInfo: sum bytes until one is not 0xFF
        let payload = &pkt.payload;
        let mut size = 0usize;
        let mut pos = 0usize;
        loop {
            if pos >= payload.len() {
                return Err(Error::ErrTruncatedLengthInfo);
            }
            let b = payload[pos];
            size += usize::from(b);
            pos += 1;
            if b != 0xFF {
                break;
            }
        }

        if size == 0 {
            return Err(Error::ErrPayloadTooSmall);
        }
        if size > MAX_ACCESS_UNIT_SIZE {
            return Err(Error::ErrAccessUnitTooBig(size, MAX_ACCESS_UNIT_SIZE));
        }

        let data = payload.slice(pos..);
        if data.len() >= size {
            // whole element in this packet, otherData dropped
            return Ok(vec![data.slice(..size)]);
        }

        self.fragments.push(data.clone());
        self.fragments_size = data.len();
        self.pending = size - data.len();
        self.fragments_next_seq = pkt.header.sequence_number.wrapping_add(1);
        Err(Error::ErrNeedMorePackets)
    }
}
