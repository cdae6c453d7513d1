use shared::error::{Error, Result};

const BITRATES_V1_L1: [u32; 14] = [
    0, 32000, 64000, 96000, 128000, 160000, 192000, 224000, 256000, 288000, 320000, 352000,
    384000, 416000,
];
const BITRATES_V1_L2: [u32; 14] = [
    0, 32000, 48000, 56000, 64000, 80000, 96000, 112000, 128000, 160000, 192000, 224000, 256000,
    320000,
];
const BITRATES_V1_L3: [u32; 14] = [
    0, 32000, 40000, 48000, 56000, 64000, 80000, 96000, 112000, 128000, 160000, 192000, 224000,
    256000,
];
const BITRATES_V2_L1: [u32; 14] = [
    0, 32000, 48000, 56000, 64000, 80000, 96000, 112000, 128000, 144000, 160000, 176000, 192000,
    224000,
];
const BITRATES_V2_L23: [u32; 14] = [
    0, 8000, 16000, 24000, 32000, 40000, 48000, 56000, 64000, 80000, 96000, 112000, 128000,
    144000,
];

const SAMPLE_RATES_V1: [u32; 3] = [44100, 48000, 32000];
const SAMPLE_RATES_V2: [u32; 3] = [22050, 24000, 16000];

/// Header of an MPEG-1/2 audio frame, the part needed to derive the frame
/// length in bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameHeader {
    /// MPEG-2 lower sampling frequencies extension.
    pub mpeg2: bool,
    /// Layer number, 1 to 3.
    pub layer: u8,
    pub bitrate: u32,
    pub sample_rate: u32,
    pub padding: bool,
}

impl FrameHeader {
    pub fn unmarshal(buf: &[u8]) -> Result<FrameHeader> {
        if buf.len() < 4 {
            return Err(Error::ErrInvalidMpegAudioHeader);
        }

        // 11-bit syncword
        if buf[0] != 0xFF || (buf[1] & 0xE0) != 0xE0 {
            return Err(Error::ErrInvalidMpegAudioHeader);
        }

        let mpeg2 = match (buf[1] >> 3) & 0x03 {
            0b11 => false,
            0b10 => true,
            _ => return Err(Error::ErrInvalidMpegAudioHeader),
        };

        let layer_field = (buf[1] >> 1) & 0x03;
        if layer_field == 0 {
            return Err(Error::ErrInvalidMpegAudioHeader);
        }
        let layer = 4 - layer_field;

        let bitrate_index = (buf[2] >> 4) & 0x0F;
        if bitrate_index == 0 || bitrate_index == 0x0F {
            return Err(Error::ErrInvalidMpegAudioHeader);
        }
        let bitrate = match (mpeg2, layer) {
            (false, 1) => BITRATES_V1_L1[bitrate_index as usize],
            (false, 2) => BITRATES_V1_L2[bitrate_index as usize],
            (false, _) => BITRATES_V1_L3[bitrate_index as usize],
            (true, 1) => BITRATES_V2_L1[bitrate_index as usize],
            (true, _) => BITRATES_V2_L23[bitrate_index as usize],
        };

        let sample_rate_index = (buf[2] >> 2) & 0x03;
        if sample_rate_index == 0x03 {
            return Err(Error::ErrInvalidMpegAudioHeader);
        }
        let sample_rate = if mpeg2 {
            SAMPLE_RATES_V2[sample_rate_index as usize]
        } else {
            SAMPLE_RATES_V1[sample_rate_index as usize]
        };

        Ok(FrameHeader {
            mpeg2,
            layer,
            bitrate,
            sample_rate,
            padding: (buf[2] >> 1) & 0x01 != 0,
        })
    }

    /// Total frame length in bytes, header included.
    pub fn frame_len(&self) -> usize {
        let padding = usize::from(self.padding);
        if self.layer == 1 {
            (12 * self.bitrate as usize / self.sample_rate as usize + padding) * 4
        } else {
            let coefficient = if self.mpeg2 && self.layer == 3 { 72 } else { 144 };
            coefficient * self.bitrate as usize / self.sample_rate as usize + padding
        }
    }
}
