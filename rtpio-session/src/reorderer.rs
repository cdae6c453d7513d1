use log::debug;
use rtp::packet::Packet;
use shared::error::{Error, Result};

/// Default ring capacity.
pub const DEFAULT_CAPACITY: usize = 64;

/// Bounded reordering buffer for RTP packets arriving over an unreliable
/// transport.
///
/// Packets are slotted into a ring keyed by sequence number. In-order
/// packets flow straight through together with any buffered run that
/// follows them; out-of-window packets flush the buffer and the missing
/// sequence numbers are reported as lost.
#[derive(Debug)]
pub struct Reorderer {
    buffer: Vec<Option<Packet>>,
    /// Ring position of the next expected sequence number.
    abs_pos: usize,
    initialized: bool,
    last_valid_seq: u16,
    /// Consecutive observations below the window; a long run means the
    /// peer restarted.
    negative_count: usize,
}

impl Default for Reorderer {
    fn default() -> Self {
        // capacity is a power of two, the constructor can not fail
        Reorderer::new(DEFAULT_CAPACITY).unwrap()
    }
}

impl Reorderer {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(Error::ErrBadReorderCapacity);
        }
        Ok(Reorderer {
            buffer: vec![None; capacity],
            abs_pos: 0,
            initialized: false,
            last_valid_seq: 0,
            negative_count: 0,
        })
    }

    fn restart(&mut self, pkt: Packet) -> (Vec<Packet>, u32) {
        for slot in &mut self.buffer {
            *slot = None;
        }
        self.negative_count = 0;
        self.last_valid_seq = pkt.header.sequence_number;
        (vec![pkt], 0)
    }

    /// Takes buffered packets in ring order starting at `abs_pos`.
    fn drain_buffered(&mut self) -> Vec<Packet> {
        let mask = self.buffer.len() - 1;
        let mut out = Vec::new();
        for i in 0..self.buffer.len() {
            if let Some(p) = self.buffer[(self.abs_pos + i) & mask].take() {
                out.push(p);
            }
        }
        out
    }

    /// Feeds one packet; returns the packets deliverable in order and the
    /// number of packets detected as lost.
    pub fn process(&mut self, pkt: Packet) -> (Vec<Packet>, u32) {
        if !self.initialized {
            self.initialized = true;
            self.last_valid_seq = pkt.header.sequence_number;
            return (vec![pkt], 0);
        }

        let mask = self.buffer.len() - 1;
        let rel = i32::from(
            pkt.header
                .sequence_number
                .wrapping_sub(self.last_valid_seq)
                .wrapping_sub(1) as i16,
        );

        // duplicate or too old
        if rel < 0 {
            self.negative_count += 1;
            if self.negative_count > self.buffer.len() {
                debug!(
                    "sequence number moved back by {} positions, assuming a stream restart",
                    -rel
                );
                return self.restart(pkt);
            }
            return (vec![], 0);
        }
        self.negative_count = 0;

        // beyond the window: flush everything and restart from this packet
        if rel as usize >= self.buffer.len() {
            let mut out = self.drain_buffered();
            let lost = rel as u32 - out.len() as u32;
            self.last_valid_seq = pkt.header.sequence_number;
            out.push(pkt);
            return (out, lost);
        }

        // the expected packet: emit it and the contiguous run behind it
        if rel == 0 {
            self.last_valid_seq = pkt.header.sequence_number;
            self.abs_pos = (self.abs_pos + 1) & mask;
            let mut out = vec![pkt];
            loop {
                let Some(p) = self.buffer[self.abs_pos].take() else {
                    break;
                };
                self.last_valid_seq = p.header.sequence_number;
                self.abs_pos = (self.abs_pos + 1) & mask;
                out.push(p);
            }
            return (out, 0);
        }

        // out of order but within the window
        let slot = (self.abs_pos + rel as usize) & mask;
        if self.buffer[slot].is_some() {
            // duplicate
            return (vec![], 0);
        }
        self.buffer[slot] = Some(pkt);
        (vec![], 0)
    }
}
