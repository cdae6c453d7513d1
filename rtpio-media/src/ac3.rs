use shared::error::{Error, Result};

/// Nominal bitrates in kbit/s, indexed by `frmsizecod >> 1`.
const BITRATES: [u32; 19] = [
    32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 448, 512, 576, 640,
];

const SAMPLE_RATES: [u32; 3] = [48000, 44100, 32000];

/// AC-3 synchronization information (ATSC A/52 section 5.3.2), the part
/// needed to locate frame boundaries inside a byte stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncInfo {
    /// Sample rate code.
    pub fscod: u8,
    /// Frame size code.
    pub frmsizecod: u8,
}

impl SyncInfo {
    pub fn unmarshal(buf: &[u8]) -> Result<SyncInfo> {
        if buf.len() < 5 {
            return Err(Error::ErrInvalidAc3SyncInfo);
        }
        if buf[0] != 0x0B || buf[1] != 0x77 {
            return Err(Error::ErrInvalidAc3SyncInfo);
        }

        // buf[2..4] carry crc1
        let fscod = buf[4] >> 6;
        if fscod == 0x03 {
            return Err(Error::ErrInvalidAc3SyncInfo);
        }
        let frmsizecod = buf[4] & 0x3F;
        if frmsizecod as usize >= BITRATES.len() * 2 {
            return Err(Error::ErrInvalidAc3SyncInfo);
        }

        Ok(SyncInfo { fscod, frmsizecod })
    }

    pub fn sample_rate(&self) -> u32 {
        SAMPLE_RATES[self.fscod as usize]
    }

    /// Frame size in bytes.
    pub fn frame_size(&self) -> usize {
        let bitrate = BITRATES[(self.frmsizecod >> 1) as usize] as usize;
        let words = match self.fscod {
            0 => 2 * bitrate,
            2 => 3 * bitrate,
            // 44.1 kHz: uneven frame sizes, the low frmsizecod bit selects
            // the longer one
            _ => bitrate * 96000 / 44100 + usize::from(self.frmsizecod & 0x01),
        };
        words * 2
    }
}
