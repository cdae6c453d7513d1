mod depacketizer;
mod packetizer;

pub use depacketizer::Mpeg4AudioLatmDepacketizer;
pub use packetizer::Mpeg4AudioLatmPacketizer;

use bytes::Bytes;
use shared::error::{Error, Result};

/// AudioMuxElements larger than this are rejected.
pub const MAX_ACCESS_UNIT_SIZE: usize = 5 * 1024;

/// MPEG-4 audio format description, LATM mode (RFC 6416 section 7.3).
///
/// The StreamMuxConfig is carried opaquely: it is negotiated out of band
/// and handed to decoders as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mpeg4AudioLatmFormat {
    pub payload_type: u8,
    pub clock_rate: u32,
    pub stream_mux_config: Bytes,
}

impl Mpeg4AudioLatmFormat {
    pub fn new(payload_type: u8, clock_rate: u32, stream_mux_config: Bytes) -> Result<Self> {
        if stream_mux_config.is_empty() {
            return Err(Error::ErrInvalidConfiguration(
                "empty StreamMuxConfig".to_string(),
            ));
        }
        if clock_rate == 0 {
            return Err(Error::ErrZeroClockRate);
        }
        Ok(Mpeg4AudioLatmFormat {
            payload_type,
            clock_rate,
            stream_mux_config,
        })
    }

    pub fn clock_rate(&self) -> u32 {
        self.clock_rate
    }
}
