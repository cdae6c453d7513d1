pub mod sps;

pub use sps::Sps;

/// NAL units larger than this are rejected.
pub const MAX_NALU_SIZE: usize = 3 * 1024 * 1024;

pub const NALU_TYPE_VPS: u8 = 32;
pub const NALU_TYPE_SPS: u8 = 33;
pub const NALU_TYPE_PPS: u8 = 34;
/// Aggregation packet (RTP only).
pub const NALU_TYPE_AGGREGATION: u8 = 48;
/// Fragmentation unit (RTP only).
pub const NALU_TYPE_FRAGMENTATION: u8 = 49;
pub const NALU_TYPE_PACI: u8 = 50;

/// Extracts the type out of the first byte of the 2-byte NAL unit header.
pub fn nalu_type(header: u8) -> u8 {
    (header >> 1) & 0x3F
}
