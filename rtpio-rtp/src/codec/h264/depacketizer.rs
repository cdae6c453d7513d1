use bytes::{BufMut, Bytes, BytesMut};
use media::h264::{
    MAX_NALU_SIZE, NALU_TYPE_FU_A, NALU_TYPE_FU_B, NALU_TYPE_MTAP16, NALU_TYPE_MTAP24,
    NALU_TYPE_STAP_A, NALU_TYPE_STAP_B, nalu_type,
};
use shared::error::{Error, Result};

use crate::packet::Packet;
use crate::packetizer::Depacketizer;

/// Reconstructs H.264 NAL units from RTP packets (RFC 6184).
///
/// Handles single NAL unit packets, STAP-A aggregations and FU-A
/// fragmentations. Interleaved modes (STAP-B, MTAP, FU-B) are rejected.
#[derive(Debug, Default)]
pub struct H264Depacketizer {
    first_packet_received: bool,
    fragments: Vec<Bytes>,
    fragments_size: usize,
    access_unit: Vec<Bytes>,
}

impl H264Depacketizer {
    pub fn new() -> Self {
        H264Depacketizer::default()
    }

    fn reset_fragments(&mut self) {
        self.fragments.clear();
        self.fragments_size = 0;
    }

    fn decode_stap_a(&mut self, payload: &Bytes) -> Result<Vec<Bytes>> {
        let mut nalus = Vec::new();
        let mut pos = 1;

        while pos < payload.len() {
            if payload.len() - pos < 2 {
                return Err(Error::ErrShortPacket);
            }
            let size = usize::from(u16::from_be_bytes([payload[pos], payload[pos + 1]]));
            pos += 2;

            if size == 0 {
                return Err(Error::ErrEmptyNalu);
            }
            if payload.len() - pos < size {
                return Err(Error::AggregationSizeLargerThanBuffer(
                    size,
                    payload.len() - pos,
                ));
            }
            nalus.push(payload.slice(pos..pos + size));
            pos += size;
        }

        if nalus.is_empty() {
            return Err(Error::ErrEmptyAggregation);
        }
        Ok(nalus)
    }

    fn decode_fu_a(&mut self, payload: &Bytes) -> Result<Vec<Bytes>> {
        if payload.len() < 3 {
            return Err(Error::ErrShortPacket);
        }

        let fu_header = payload[1];
        let start = (fu_header & 0b1000_0000) != 0;
        let end = (fu_header & 0b0100_0000) != 0;

        if start {
            // explicit start of a new fragment group, drop whatever came
            // before
            self.reset_fragments();

            let header = (payload[0] & 0b1110_0000) | (fu_header & 0b0001_1111);
            let mut first = BytesMut::with_capacity(payload.len() - 1);
            first.put_u8(header);
            first.put_slice(&payload[2..]);
            self.fragments.push(first.freeze());
            self.fragments_size = payload.len() - 1;
        } else {
            if self.fragments.is_empty() {
                if !self.first_packet_received {
                    return Err(Error::ErrNonStartingFragment);
                }
                return Err(Error::ErrUnexpectedFragment);
            }

            self.fragments_size += payload.len() - 2;
            if self.fragments_size > MAX_NALU_SIZE {
                let size = self.fragments_size;
                self.reset_fragments();
                return Err(Error::ErrNaluTooBig(size, MAX_NALU_SIZE));
            }
            self.fragments.push(payload.slice(2..));
        }

        if !end {
            return Err(Error::ErrNeedMorePackets);
        }

        let mut nalu = BytesMut::with_capacity(self.fragments_size);
        for frag in self.fragments.drain(..) {
            nalu.put_slice(&frag);
        }
        self.fragments_size = 0;
        Ok(vec![nalu.freeze()])
    }

    /// Accumulates NAL units until a packet with the marker bit closes the
    /// access unit, then emits the whole unit.
    pub fn depacketize_until_marker(&mut self, pkt: &Packet) -> Result<Vec<Bytes>> {
        let nalus = self.depacketize(pkt)?;
        self.access_unit.extend(nalus);

        if pkt.header.marker {
            return Ok(std::mem::take(&mut self.access_unit));
        }
        Err(Error::ErrNeedMorePackets)
    }
}

impl Depacketizer for H264Depacketizer {
    fn depacketize(&mut self, pkt: &Packet) -> Result<Vec<Bytes>> {
        if pkt.payload.is_empty() {
            return Err(Error::ErrPayloadTooSmall);
        }

        let typ = nalu_type(pkt.payload[0]);
        let nalus = match typ {
            1..=23 => {
                self.reset_fragments();
                Ok(vec![pkt.payload.clone()])
            }
            NALU_TYPE_STAP_A => {
                self.reset_fragments();
                self.decode_stap_a(&pkt.payload)
            }
            NALU_TYPE_FU_A => self.decode_fu_a(&pkt.payload),
            NALU_TYPE_STAP_B => Err(Error::ErrStapBUnsupported),
            NALU_TYPE_MTAP16 | NALU_TYPE_MTAP24 => Err(Error::ErrMtapUnsupported),
            NALU_TYPE_FU_B => Err(Error::ErrFuBUnsupported),
            _ => Err(Error::NaluTypeIsNotHandled(typ)),
        };

        self.first_packet_received = true;
        nalus
    }
}
