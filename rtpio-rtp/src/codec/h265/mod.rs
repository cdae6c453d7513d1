mod depacketizer;
mod packetizer;

pub use depacketizer::H265Depacketizer;
pub use packetizer::H265Packetizer;

use std::sync::Mutex;

use bytes::Bytes;
use shared::error::{Error, Result};

/// H.265 format description (RFC 7798).
///
/// Like the H.264 variant, parameter sets are lock-guarded so that one
/// side of a session can refresh them while the other reads them.
#[derive(Debug, Default)]
pub struct H265Format {
    payload_type: u8,
    vps: Mutex<Option<Bytes>>,
    sps: Mutex<Option<Bytes>>,
    pps: Mutex<Option<Bytes>>,
}

impl H265Format {
    /// `max_don_diff` is the sprop-max-don-diff SDP parameter; only zero
    /// (no decoding-order rearrangement) is supported.
    pub fn new(
        payload_type: u8,
        max_don_diff: u32,
        vps: Option<Bytes>,
        sps: Option<Bytes>,
        pps: Option<Bytes>,
    ) -> Result<Self> {
        if max_don_diff != 0 {
            return Err(Error::ErrDonlUnsupported);
        }
        Ok(H265Format {
            payload_type,
            vps: Mutex::new(vps),
            sps: Mutex::new(sps),
            pps: Mutex::new(pps),
        })
    }

    pub fn payload_type(&self) -> u8 {
        self.payload_type
    }

    pub fn clock_rate(&self) -> u32 {
        90000
    }

    pub fn safe_vps(&self) -> Option<Bytes> {
        self.vps.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn safe_set_vps(&self, vps: Bytes) {
        *self.vps.lock().unwrap_or_else(|e| e.into_inner()) = Some(vps);
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
