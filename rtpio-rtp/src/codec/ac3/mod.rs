mod depacketizer;
mod packetizer;

pub use depacketizer::Ac3Depacketizer;
pub use packetizer::Ac3Packetizer;

use serde::{Deserialize, Serialize};
use shared::error::{Error, Result};

/// Fragment type codes of the 2-byte payload header (RFC 4184).
pub(crate) const FRAGMENT_TYPE_COMPLETE: u8 = 0;
pub(crate) const FRAGMENT_TYPE_INITIAL_MOST: u8 = 1;
pub(crate) const FRAGMENT_TYPE_INITIAL: u8 = 2;
pub(crate) const FRAGMENT_TYPE_CONTINUATION: u8 = 3;

/// AC-3 format description (RFC 4184).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ac3Format {
    pub payload_type: u8,
    pub sample_rate: u32,
}

impl Ac3Format {
    pub fn new(payload_type: u8, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::ErrZeroClockRate);
        }
        Ok(Ac3Format {
            payload_type,
            sample_rate,
        })
    }

    pub fn clock_rate(&self) -> u32 {
        self.sample_rate
    }
}
