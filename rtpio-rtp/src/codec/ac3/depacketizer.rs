use bytes::{BufMut, Bytes, BytesMut};
use media::ac3::SyncInfo;
use shared::error::{Error, Result};

use crate::codec::ac3::{
    FRAGMENT_TYPE_COMPLETE, FRAGMENT_TYPE_CONTINUATION, FRAGMENT_TYPE_INITIAL,
    FRAGMENT_TYPE_INITIAL_MOST,
};
use crate::packet::Packet;
use crate::packetizer::Depacketizer;

/// Reconstructs AC-3 frames from RTP packets (RFC 4184).
///
/// Frame boundaries inside aggregated packets come from the AC-3 sync
/// information; fragmented frames are reassembled until the size the
/// first fragment declares is reached.
#[derive(Debug, Default)]
pub struct Ac3Depacketizer {
    first_packet_received: bool,
    fragments: Vec<Bytes>,
    fragments_size: usize,
    fragments_total: usize,
    fragments_next_seq: u16,
}

impl Ac3Depacketizer {
    pub fn new() -> Self {
        Ac3Depacketizer::default()
    }

    fn reset_fragments(&mut self) {
        self.fragments.clear();
        self.fragments_size = 0;
        self.fragments_total = 0;
    }

    fn decode_aggregated(&mut self, count: u8, data: Bytes) -> Result<Vec<Bytes>> {
        if count == 0 {
            return Err(Error::ErrEmptyAggregation);
        }

        let mut frames = Vec::with_capacity(usize::from(count));
        let mut pos = 0;

        for _ in 0..count {
            let rem = data.slice(pos..);
            let sync_info = SyncInfo::unmarshal(&rem)?;
            let size = sync_info.frame_size();
            if rem.len() < size {
                return Err(Error::AggregationSizeLargerThanBuffer(size, rem.len()));
            }
            frames.push(rem.slice(..size));
            pos += size;
        }

        if pos != data.len() {
            return Err(Error::AggregationSizeLargerThanBuffer(
                data.len() - pos,
                0,
            ));
        }
        Ok(frames)
    }

    fn decode_initial_fragment(&mut self, pkt: &Packet, data: Bytes) -> Result<Vec<Bytes>> {
        self.reset_fragments();

        let sync_info = SyncInfo::unmarshal(&data)?;
        let total = sync_info.frame_size();
        if data.len() >= total {
            return Err(Error::ErrInvalidFragmentType(FRAGMENT_TYPE_INITIAL));
        }

        self.fragments_size = data.len();
        self.fragments_total = total;
        self.fragments.push(data);
        self.fragments_next_seq = pkt.header.sequence_number.wrapping_add(1);
        Err(Error::ErrNeedMorePackets)
    }

    fn decode_continuation(&mut self, pkt: &Packet, data: Bytes) -> Result<Vec<Bytes>> {
        if self.fragments.is_empty() {
            if !self.first_packet_received {
                return Err(Error::ErrNonStartingFragment);
            }
            return Err(Error::ErrUnexpectedFragment);
        }
        if pkt.header.sequence_number != self.fragments_next_seq {
            self.reset_fragments();
            return Err(Error::ErrRtpPacketMissing);
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

impl Depacketizer for Ac3Depacketizer {
    fn depacketize(&mut self, pkt: &Packet) -> Result<Vec<Bytes>> {
        let was_first = !self.first_packet_received;

        if pkt.payload.len() < 3 {
            return Err(Error::ErrPayloadTooSmall);
        }
        if (pkt.payload[0] & 0b1111_1100) != 0 {
            return Err(Error::ErrMbzNotZero);
        }
        let fragment_type = pkt.payload[0] & 0b0000_0011;
        let count = pkt.payload[1];
        let data = pkt.payload.slice(2..);

        let res = match fragment_type {
            FRAGMENT_TYPE_COMPLETE => {
                self.reset_fragments();
                self.decode_aggregated(count, data)
            }
            FRAGMENT_TYPE_INITIAL_MOST | FRAGMENT_TYPE_INITIAL => {
                self.decode_initial_fragment(pkt, data)
            }
            FRAGMENT_TYPE_CONTINUATION => {
                if was_first {
                    Err(Error::ErrNonStartingFragment)
                } else {
                    self.decode_continuation(pkt, data)
                }
            }
            _ => unreachable!("two-bit field"),
        };

        self.first_packet_received = true;
        res
    }
}
