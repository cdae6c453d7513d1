/// Allocates consecutive RTP sequence numbers, wrapping at the u16
/// boundary.
#[derive(Debug, Clone)]
pub struct Sequencer {
    next: u16,
    roll_over_count: u64,
}

impl Sequencer {
    pub fn new(initial: u16) -> Self {
        Sequencer {
            next: initial,
            roll_over_count: 0,
        }
    }

    /// Starts from a random sequence number, as RFC 3550 section 5.1
    /// recommends.
    pub fn new_random() -> Self {
        Self::new(rand::random::<u16>())
    }

    pub fn next_sequence_number(&mut self) -> u16 {
        let n = self.next;
        self.next = self.next.wrapping_add(1);
        if self.next == 0 {
            self.roll_over_count += 1;
        }
        n
    }

    /// How many times the sequence number has wrapped.
    pub fn roll_over_count(&self) -> u64 {
        self.roll_over_count
    }
}
