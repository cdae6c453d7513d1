mod depacketizer;
mod descriptor;
mod packetizer;

pub use depacketizer::Vp9Depacketizer;
pub use descriptor::Vp9Descriptor;
pub use packetizer::Vp9Packetizer;

use serde::{Deserialize, Serialize};

/// Frames larger than this are rejected.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// VP9 format description (draft-ietf-payload-vp9).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vp9Format {
    pub payload_type: u8,
    pub max_fr: Option<u32>,
    pub max_fs: Option<u32>,
    pub profile_id: Option<u32>,
}

impl Vp9Format {
    pub fn new(
        payload_type: u8,
        max_fr: Option<u32>,
        max_fs: Option<u32>,
        profile_id: Option<u32>,
    ) -> Self {
        Vp9Format {
            payload_type,
            max_fr,
            max_fs,
            profile_id,
        }
    }

    pub fn clock_rate(&self) -> u32 {
        90000
    }
}
