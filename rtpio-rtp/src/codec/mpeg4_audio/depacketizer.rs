use bytes::{BufMut, Bytes, BytesMut};
use media::bits::BitReader;
use media::mpeg4audio::adts;
use shared::error::{Error, Result};

use crate::codec::mpeg4_audio::MAX_ACCESS_UNIT_SIZE;
use crate::packet::Packet;
use crate::packetizer::Depacketizer;

/// Reconstructs MPEG-4 audio access units from RTP packets
/// (RFC 3640, AAC-hbr mode).
///
/// Interleaving is not supported: AU-Index and AU-Index-delta must be
/// zero. Some cameras wrap each AU in an ADTS frame; that wrapping is
/// detected on the first access unit and then unwrapped for the rest of
/// the session.
#[derive(Debug)]
pub struct Mpeg4AudioDepacketizer {
    size_length: usize,
    index_length: usize,
    index_delta_length: usize,

    fragments: Vec<Bytes>,
    fragments_size: usize,
    fragments_next_seq: u16,
    adts_mode: Option<bool>,
}

impl Mpeg4AudioDepacketizer {
    pub fn new(size_length: usize, index_length: usize, index_delta_length: usize) -> Self {
        Mpeg4AudioDepacketizer {
            size_length,
            index_length,
            index_delta_length,
            fragments: Vec::new(),
            fragments_size: 0,
            fragments_next_seq: 0,
            adts_mode: None,
        }
    }

    fn reset_fragments(&mut self) {
        self.fragments.clear();
        self.fragments_size = 0;
    }

    /// Parses the AU-headers-length field and the AU headers, returning
    /// the declared AU sizes and the offset of the data section.
    fn parse_au_headers(&self, payload: &Bytes) -> Result<(Vec<usize>, usize)> {
        if payload.len() < 2 {
            return Err(Error::ErrPayloadTooSmall);
        }
        let headers_len_bits = usize::from(u16::from_be_bytes([payload[0], payload[1]]));

        let first_bits = self.size_length + self.index_length;
        let other_bits = self.size_length + self.index_delta_length;
        if headers_len_bits < first_bits
            || (headers_len_bits - first_bits) % other_bits != 0
        {
            return Err(Error::ErrInvalidAuHeadersLength);
        }
        let count = 1 + (headers_len_bits - first_bits) / other_bits;

        let headers_bytes = headers_len_bits.div_ceil(8);
        if payload.len() < 2 + headers_bytes {
            return Err(Error::ErrPayloadTooSmall);
        }

        let mut r = BitReader::new(&payload[2..2 + headers_bytes]);
        let mut sizes = Vec::with_capacity(count);
        for i in 0..count {
            sizes.push(r.read_bits(self.size_length)? as usize);
            let index_bits = if i == 0 {
                self.index_length
            } else {
                self.index_delta_length
            };
            if r.read_bits(index_bits)? != 0 {
                return Err(Error::ErrAuIndexNotZero);
            }
        }

        Ok((sizes, 2 + headers_bytes))
    }

    fn decode_fragmented(&mut self, pkt: &Packet) -> Result<Vec<Bytes>> {
        if pkt.header.sequence_number != self.fragments_next_seq {
            self.reset_fragments();
            return Err(Error::ErrRtpPacketMissing);
        }

        let (sizes, offset) = match self.parse_au_headers(&pkt.payload) {
            Ok(v) => v,
            Err(e) => {
                self.reset_fragments();
                return Err(e);
            }
        };
        if sizes.len() != 1 {
            self.reset_fragments();
            return Err(Error::ErrFragmentedMultipleAus);
        }

        let data = pkt.payload.slice(offset..);
        self.fragments_size += data.len();
        if self.fragments_size > MAX_ACCESS_UNIT_SIZE {
            let size = self.fragments_size;
            self.reset_fragments();
            return Err(Error::ErrAccessUnitTooBig(size, MAX_ACCESS_UNIT_SIZE));
        }
        self.fragments.push(data);

        if !pkt.header.marker {
            self.fragments_next_seq = pkt.header.sequence_number.wrapping_add(1);
            return Err(Error::ErrNeedMorePackets);
        }

        let mut au = BytesMut::with_capacity(self.fragments_size);
        for frag in self.fragments.drain(..) {
            au.put_slice(&frag);
        }
        self.fragments_size = 0;
        self.finish(vec![au.freeze()])
    }

    /// Applies the ADTS unwrapping quirk and returns the final AUs.
    fn finish(&mut self, aus: Vec<Bytes>) -> Result<Vec<Bytes>> {
        let adts_mode = *self.adts_mode.get_or_insert_with(|| {
            let au = &aus[0];
            au.len() >= 2
                && au[0] == 0xFF
                && (au[1] & 0xF0) == 0xF0
                && matches!(adts::unmarshal(au), Ok(pkts) if pkts.len() == 1)
        });

        if !adts_mode {
            return Ok(aus);
        }

        if aus.len() != 1 {
            return Err(Error::ErrAuCountMismatch);
        }
        let pkts = adts::unmarshal(&aus[0])?;
        if pkts.len() != 1 {
            return Err(Error::ErrAdtsMultipleFramesUnsupported);
        }
        Ok(vec![pkts[0].au.clone()])
    }
}

impl Depacketizer for Mpeg4AudioDepacketizer {
    fn depacketize(&mut self, pkt: &Packet) -> Result<Vec<Bytes>> {
        if !self.fragments.is_empty() {
            return self.decode_fragmented(pkt);
        }

        let (sizes, offset) = self.parse_au_headers(&pkt.payload)?;
        let data = pkt.payload.slice(offset..);

        if !pkt.header.marker {
            // start of a fragmented access unit
            if sizes.len() != 1 {
                return Err(Error::ErrFragmentedMultipleAus);
            }
            if data.len() > MAX_ACCESS_UNIT_SIZE {
                return Err(Error::ErrAccessUnitTooBig(data.len(), MAX_ACCESS_UNIT_SIZE));
            }
            self.fragments_size = data.len();
            self.fragments.push(data);
            self.fragments_next_seq = pkt.header.sequence_number.wrapping_add(1);
            return Err(Error::ErrNeedMorePackets);
        }

        let mut aus = Vec::with_capacity(sizes.len());
        let mut pos = 0;
        for size in sizes {
            if size > MAX_ACCESS_UNIT_SIZE {
                return Err(Error::ErrAccessUnitTooBig(size, MAX_ACCESS_UNIT_SIZE));
            }
            if data.len() - pos < size {
                return Err(Error::AggregationSizeLargerThanBuffer(
                    size,
                    data.len() - pos,
                ));
            }
            aus.push(data.slice(pos..pos + size));
            pos += size;
        }

        self.finish(aus)
    }
}
