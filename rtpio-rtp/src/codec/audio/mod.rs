mod depacketizer;
mod packetizer;

pub use depacketizer::SimpleAudioDepacketizer;
pub use packetizer::SimpleAudioPacketizer;

use serde::{Deserialize, Serialize};
use shared::error::{Error, Result};

/// Format description for codecs that carry one audio frame per RTP
/// packet: Opus, G.711, G.722, LPCM and similar.
///
/// Note that some of these codecs fix the RTP clock rate regardless of
/// the audio sample rate: Opus always uses 48000, G.722 always uses 8000.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleAudioFormat {
    pub payload_type: u8,
    pub clock_rate: u32,
}

impl SimpleAudioFormat {
    pub fn new(payload_type: u8, clock_rate: u32) -> Result<Self> {
        if clock_rate == 0 {
            return Err(Error::ErrZeroClockRate);
        }
        Ok(SimpleAudioFormat {
            payload_type,
            clock_rate,
        })
    }

    pub fn clock_rate(&self) -> u32 {
        self.clock_rate
    }
}
