use bytes::Bytes;
use shared::error::{Error, Result};

use crate::packet::Packet;
use crate::packetizer::Depacketizer;

/// Extracts audio frames from RTP packets carrying exactly one frame
/// each. The payload is the frame.
#[derive(Debug, Default)]
pub struct SimpleAudioDepacketizer {}

impl SimpleAudioDepacketizer {
    pub fn new() -> Self {
        SimpleAudioDepacketizer::default()
    }
}

impl Depacketizer for SimpleAudioDepacketizer {
    fn depacketize(&mut self, pkt: &Packet) -> Result<Vec<Bytes>> {
        if pkt.payload.is_empty() {
            return Err(Error::ErrPayloadTooSmall);
        }
        Ok(vec![pkt.payload.clone()])
    }
}
