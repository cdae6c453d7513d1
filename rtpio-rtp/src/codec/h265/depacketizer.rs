use bytes::{BufMut, Bytes, BytesMut};
use media::h265::{
    MAX_NALU_SIZE, NALU_TYPE_AGGREGATION, NALU_TYPE_FRAGMENTATION, NALU_TYPE_PACI, nalu_type,
};
use shared::error::{Error, Result};

use crate::packet::Packet;
use crate::packetizer::Depacketizer;

/// Reconstructs H.265 NAL units from RTP packets (RFC 7798).
///
/// Handles single NAL unit packets, aggregation packets (type 48) and
/// fragmentation units (type 49). PACI packets are rejected.
#[derive(Debug, Default)]
pub struct H265Depacketizer {
    first_packet_received: bool,
    fragments: Vec<Bytes>,
    fragments_size: usize,
    access_unit: Vec<Bytes>,
}

impl H265Depacketizer {
    pub fn new() -> Self {
        H265Depacketizer::default()
    }

    fn reset_fragments(&mut self) {
        self.fragments.clear();
        self.fragments_size = 0;
    }

    fn decode_aggregation(&mut self, payload: &Bytes) -> Result<Vec<Bytes>> {
        let mut nalus = Vec::new();
        let mut pos = 2;

        while pos < payload.len() {
            if payload.len() - pos < 2 {
                return Err(Error::ErrShortPacket);
            }
            let size = usize::from(u16::from_be_bytes([payload[pos], payload[pos + 1]]));
            pos += 2;

            if size < 2 {
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

    fn decode_fragmentation(&mut self, payload: &Bytes) -> Result<Vec<Bytes>> {
        if payload.len() < 4 {
            return Err(Error::ErrShortPacket);
        }

        let fu_header = payload[2];
        let start = (fu_header & 0b1000_0000) != 0;
        let end = (fu_header & 0b0100_0000) != 0;
        let typ = fu_header & 0b0011_1111;

        if start {
            self.reset_fragments();

            let mut first = BytesMut::with_capacity(payload.len() - 1);
            first.put_u8((payload[0] & 0b1000_0001) | (typ << 1));
            first.put_u8(payload[1]);
            first.put_slice(&payload[3..]);
            self.fragments.push(first.freeze());
            self.fragments_size = payload.len() - 1;
        } else {
            if self.fragments.is_empty() {
                if !self.first_packet_received {
                    return Err(Error::ErrNonStartingFragment);
                }
                return Err(Error::ErrUnexpectedFragment);
            }

            self.fragments_size += payload.len() - 3;
            if self.fragments_size > MAX_NALU_SIZE {
                let size = self.fragments_size;
                self.reset_fragments();
                return Err(Error::ErrNaluTooBig(size, MAX_NALU_SIZE));
            }
            self.fragments.push(payload.slice(3..));
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

impl Depacketizer for H265Depacketizer {
    fn depacketize(&mut self, pkt: &Packet) -> Result<Vec<Bytes>> {
        if pkt.payload.len() < 2 {
            return Err(Error::ErrPayloadTooSmall);
        }

        let typ = nalu_type(pkt.payload[0]);
        let nalus = match typ {
            NALU_TYPE_AGGREGATION => {
                self.reset_fragments();
                self.decode_aggregation(&pkt.payload)
            }
            NALU_TYPE_FRAGMENTATION => self.decode_fragmentation(&pkt.payload),
            NALU_TYPE_PACI => Err(Error::ErrPaciUnsupported),
            _ => {
                self.reset_fragments();
                Ok(vec![pkt.payload.clone()])
            }
        };

        self.first_packet_received = true;
        nalus
    }
}
