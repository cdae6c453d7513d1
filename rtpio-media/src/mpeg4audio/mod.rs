pub mod adts;
pub mod config;

pub use adts::AdtsPacket;
pub use config::AudioSpecificConfig;

/// MPEG-4 audio object type for AAC low complexity, the only object type
/// this crate handles.
pub const OBJECT_TYPE_AAC_LC: u8 = 2;

/// Sample rates addressable through the 4-bit sampling frequency index.
pub(crate) const SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

pub(crate) fn sample_rate_index(rate: u32) -> Option<u8> {
    SAMPLE_RATES.iter().position(|&r| r == rate).map(|i| i as u8)
}

/// Maps the channel configuration field to a channel count. Configuration
/// 7 means 7.1, i.e. eight channels.
pub(crate) fn channel_count(config: u8) -> Option<u8> {
    match config {
        1..=6 => Some(config),
        7 => Some(8),
        _ => None,
    }
}

pub(crate) fn channel_config(count: u8) -> Option<u8> {
    match count {
        1..=6 => Some(count),
        8 => Some(7),
        _ => None,
    }
}
