mod depacketizer;
mod packetizer;

pub use depacketizer::Mpeg4AudioDepacketizer;
pub use packetizer::Mpeg4AudioPacketizer;

use media::mpeg4audio::AudioSpecificConfig;
use shared::error::{Error, Result};

/// Access units larger than this are rejected.
pub const MAX_ACCESS_UNIT_SIZE: usize = 5 * 1024;

/// Default payload budget; lower than the usual 1460 to leave room for
/// SRTP overhead.
pub const DEFAULT_PAYLOAD_MAX_SIZE: usize = 1450;

/// MPEG-4 audio format description, AAC-hbr mode (RFC 3640).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mpeg4AudioFormat {
    pub payload_type: u8,
    pub config: AudioSpecificConfig,
    /// Bits of the AU-size field in each AU header.
    pub size_length: usize,
    /// Bits of the AU-Index field in the first AU header.
    pub index_length: usize,
    /// Bits of the AU-Index-delta field in subsequent AU headers.
    pub index_delta_length: usize,
}

impl Mpeg4AudioFormat {
    pub fn new(
        payload_type: u8,
        config: AudioSpecificConfig,
        size_length: usize,
        index_length: usize,
        index_delta_length: usize,
    ) -> Result<Self> {
        if size_length == 0 || size_length > 32 {
            return Err(Error::ErrInvalidConfiguration(format!(
                "invalid sizelength {size_length}"
            )));
        }
        if index_length > 32 || index_delta_length > 32 {
            return Err(Error::ErrInvalidConfiguration(
                "invalid indexlength".to_string(),
            ));
        }
        Ok(Mpeg4AudioFormat {
            payload_type,
            config,
            size_length,
            index_length,
            index_delta_length,
        })
    }

    pub fn clock_rate(&self) -> u32 {
        self.config.sample_rate
    }
}
