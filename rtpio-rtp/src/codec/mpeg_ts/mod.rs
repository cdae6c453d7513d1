mod depacketizer;
mod packetizer;

pub use depacketizer::MpegTsDepacketizer;
pub use packetizer::MpegTsPacketizer;

use serde::{Deserialize, Serialize};

/// Static payload type assigned to MPEG-2 transport streams (RFC 3551).
pub const PAYLOAD_TYPE: u8 = 33;

/// Size of one transport stream packet.
pub const TS_PACKET_SIZE: usize = 188;

/// Transport stream sync byte.
pub const TS_SYNC_BYTE: u8 = 0x47;

/// Default payload budget: seven whole TS packets.
pub const DEFAULT_PAYLOAD_MAX_SIZE: usize = 7 * TS_PACKET_SIZE;

/// MPEG-2 transport stream format description (RFC 2250). Payload type
/// and clock rate are fixed by RFC 3551.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpegTsFormat {}

impl MpegTsFormat {
    pub fn new() -> Self {
        MpegTsFormat {}
    }

    pub fn payload_type(&self) -> u8 {
        PAYLOAD_TYPE
    }

    pub fn clock_rate(&self) -> u32 {
        90000
    }
}
