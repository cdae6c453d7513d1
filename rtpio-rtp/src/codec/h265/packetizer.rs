use bytes::{BufMut, Bytes, BytesMut};
use media::h265::{MAX_NALU_SIZE, NALU_TYPE_AGGREGATION, NALU_TYPE_FRAGMENTATION};
use shared::error::{Error, Result};

use crate::packet::Packet;
use crate::packetizer::{DEFAULT_PAYLOAD_MAX_SIZE, PacketFactory, Packetizer};

/// Converts H.265 access units into RTP packets (RFC 7798).
///
/// Small NAL units are aggregated into AP packets, oversized NAL units
/// are split into FUs. The marker bit is set on the last packet of each
/// access unit.
#[derive(Debug)]
pub struct H265Packetizer {
    payload_max_size: usize,
    factory: PacketFactory,
}

impl H265Packetizer {
    pub fn new(
        payload_type: u8,
        ssrc: Option<u32>,
        initial_sequence_number: Option<u16>,
        initial_timestamp: Option<u32>,
        payload_max_size: Option<usize>,
    ) -> Self {
        H265Packetizer {
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
        match batch.len() {
            0 => {}
            1 => {
                let nalu = batch.remove(0);
                packets.push(self.factory.new_packet(timestamp, false, nalu));
            }
            _ => {
                let mut payload =
                    BytesMut::with_capacity(2 + batch.iter().map(|n| 2 + n.len()).sum::<usize>());
                // AP NAL header: layer and temporal id from the first unit
                payload.put_u8((batch[0][0] & 0b1000_0001) | (NALU_TYPE_AGGREGATION << 1));
                payload.put_u8(batch[0][1]);
                for nalu in batch.drain(..) {
                    payload.put_u16(nalu.len() as u16);
                    payload.put_slice(&nalu);
                }
                packets.push(self.factory.new_packet(timestamp, false, payload.freeze()));
            }
        }
    }

    fn write_fragments(&mut self, packets: &mut Vec<Packet>, nalu: &Bytes, timestamp: u32) {
        let b0 = (nalu[0] & 0b1000_0001) | (NALU_TYPE_FRAGMENTATION << 1);
        let b1 = nalu[1];
        let nalu_type = (nalu[0] >> 1) & 0b0011_1111;
        let body = &nalu[2..];

        let avail = self.payload_max_size - 3;
        let count = body.len().div_ceil(avail);

        for (i, chunk) in body.chunks(avail).enumerate() {
            let mut payload = BytesMut::with_capacity(3 + chunk.len());
            payload.put_u8(b0);
            payload.put_u8(b1);
            let mut fu_header = nalu_type;
            if i == 0 {
                fu_header |= 0b1000_0000; // start
            }
            if i == count - 1 {
                fu_header |= 0b0100_0000; // end
            }
            payload.put_u8(fu_header);
            payload.put_slice(chunk);
            packets.push(self.factory.new_packet(timestamp, false, payload.freeze()));
        }
    }
}

impl Packetizer for H265Packetizer {
    fn packetize(&mut self, nalus: &[Bytes], timestamp: u32) -> Result<Vec<Packet>> {
        let mut packets = Vec::new();
        let mut batch: Vec<Bytes> = Vec::new();
        let mut batch_size = 2; // AP NAL header

        for nalu in nalus {
            if nalu.len() < 2 {
                return Err(Error::ErrEmptyNalu);
            }
            if nalu.len() > MAX_NALU_SIZE {
                return Err(Error::ErrNaluTooBig(nalu.len(), MAX_NALU_SIZE));
            }

            if nalu.len() > self.payload_max_size {
                self.flush_batch(&mut packets, &mut batch, timestamp);
                batch_size = 2;
                self.write_fragments(&mut packets, nalu, timestamp);
                continue;
            }

            if batch_size + 2 + nalu.len() > self.payload_max_size {
                self.flush_batch(&mut packets, &mut batch, timestamp);
                batch_size = 2;
            }
            batch_size += 2 + nalu.len();
            batch.push(nalu.clone());
        }
        self.flush_batch(&mut packets, &mut batch, timestamp);

        match packets.last_mut() {
            Some(last) => last.header.marker = true,
            None => return Err(Error::ErrEmptyNalu),
        }

        Ok(packets)
    }
}
