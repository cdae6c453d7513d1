mod depacketizer;
mod packetizer;

pub use depacketizer::H264Depacketizer;
pub use packetizer::H264Packetizer;

use std::sync::Mutex;

use bytes::Bytes;
use shared::error::{Error, Result};

/// H.264 format description (RFC 6184).
///
/// Parameter sets can change mid-session: a receive path may update them
/// while another thread reads them for media descriptions, so they sit
/// behind a lock and are accessed by value.
#[derive(Debug, Default)]
pub struct H264Format {
    payload_type: u8,
    packetization_mode: u8,
    sps: Mutex<Option<Bytes>>,
    pps: Mutex<Option<Bytes>>,
}

impl H264Format {
    pub fn new(
        payload_type: u8,
        packetization_mode: u8,
        sps: Option<Bytes>,
        pps: Option<Bytes>,
    ) -> Result<Self> {
        if packetization_mode > 1 {
            return Err(Error::ErrInterleavedModeUnsupported);
        }
        Ok(H264Format {
            payload_type,
            packetization_mode,
            sps: Mutex::new(sps),
            pps: Mutex::new(pps),
        })
    }

    pub fn payload_type(&self) -> u8 {
        self.payload_type
    }

    pub fn packetization_mode(&self) -> u8 {
        self.packetization_mode
    }

    pub fn clock_rate(&self) -> u32 {
        90000
    }

    pub fn safe_sps(&self) -> Option<Bytes> {
        self.sps.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn safe_set_sps(&self, sps: Bytes) {
        *self.sps.lock().unwrap_or_else(|e| e.into_inner()) = Some(sps);
    }

    pub fn safe_pps(&self) -> Option<Bytes> {
        self.pps.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn safe_set_pps(&self, pps: Bytes) {
        *self.pps.lock().unwrap_or_else(|e| e.into_inner()) = Some(pps);
    }
}
