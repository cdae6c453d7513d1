mod depacketizer;
mod packetizer;

pub use depacketizer::MpegAudioDepacketizer;
pub use packetizer::MpegAudioPacketizer;

use serde::{Deserialize, Serialize};

/// Static payload type assigned to MPEG audio (RFC 3551).
pub const PAYLOAD_TYPE: u8 = 14;

/// MPEG-1/2 audio format description (RFC 2250). Payload type and clock
/// rate are fixed by RFC 3551.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpegAudioFormat {}

impl MpegAudioFormat {
    pub fn new() -> Self {
        MpegAudioFormat {}
    }

    pub fn payload_type(&self) -> u8 {
        PAYLOAD_TYPE
    }

    pub fn clock_rate(&self) -> u32 {
        90000
    }
}
