use shared::error::{Error, Result};

use crate::bits::{BitReader, BitWriter};
use crate::mpeg4audio::{
    OBJECT_TYPE_AAC_LC, SAMPLE_RATES, channel_config, channel_count, sample_rate_index,
};

/// MPEG-4 AudioSpecificConfig (ISO 14496-3 section 1.6.2.1), the codec
/// parameters conveyed through SDP. Only AAC-LC is handled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioSpecificConfig {
    pub object_type: u8,
    pub sample_rate: u32,
    pub channel_count: u8,
    pub frame_length_flag: bool,
    pub depends_on_core_coder: bool,
    pub core_coder_delay: u16,
}

impl AudioSpecificConfig {
    pub fn unmarshal(buf: &[u8]) -> Result<AudioSpecificConfig> {
        let mut r = BitReader::new(buf);

        let object_type = r.read_bits(5)? as u8;
        if object_type != OBJECT_TYPE_AAC_LC {
            return Err(Error::ErrUnsupportedAudioType(object_type));
        }

        let sample_rate_index = r.read_bits(4)? as u8;
        let sample_rate = match sample_rate_index {
            15 => r.read_bits(24)? as u32,
            i if (i as usize) < SAMPLE_RATES.len() => SAMPLE_RATES[i as usize],
            _ => return Err(Error::ErrInvalidSampleRateIndex(sample_rate_index)),
        };

        let channel_config_field = r.read_bits(4)? as u8;
        let channel_count = channel_count(channel_config_field)
            .ok_or(Error::ErrInvalidChannelConfig(channel_config_field))?;

        // GASpecificConfig; tolerate configs truncated right after the
        // channel configuration
        let mut config = AudioSpecificConfig {
            object_type,
            sample_rate,
            channel_count,
            ..Default::default()
        };
        if r.remaining_bits() >= 1 {
            config.frame_length_flag = r.read_flag()?;
        }
        if r.remaining_bits() >= 1 {
            config.depends_on_core_coder = r.read_flag()?;
            if config.depends_on_core_coder {
                config.core_coder_delay = r.read_bits(14)? as u16;
            }
        }

        Ok(config)
    }

    pub fn marshal(&self) -> Result<Vec<u8>> {
        if self.object_type != OBJECT_TYPE_AAC_LC {
            return Err(Error::ErrUnsupportedAudioType(self.object_type));
        }
        let channel_config_field = channel_config(self.channel_count)
            .ok_or(Error::ErrInvalidChannelConfig(self.channel_count))?;

        let mut w = BitWriter::new();
        w.write_bits(u64::from(self.object_type), 5);
        match sample_rate_index(self.sample_rate) {
            Some(i) => w.write_bits(u64::from(i), 4),
            None => {
                w.write_bits(15, 4);
                w.write_bits(u64::from(self.sample_rate), 24);
            }
        }
        w.write_bits(u64::from(channel_config_field), 4);
        w.write_flag(self.frame_length_flag);
        w.write_flag(self.depends_on_core_coder);
        if self.depends_on_core_coder {
            w.write_bits(u64::from(self.core_coder_delay), 14);
        }
        w.write_flag(false); // extension_flag

        Ok(w.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmarshal_lc_44100_stereo() -> Result<()> {
        // 00010 0100 0010 ...
        let config = AudioSpecificConfig::unmarshal(&[0x12, 0x10])?;

        assert_eq!(config.object_type, OBJECT_TYPE_AAC_LC);
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.channel_count, 2);

        Ok(())
    }

    #[test]
    fn test_unmarshal_explicit_sample_rate() -> Result<()> {
        let config = AudioSpecificConfig {
            object_type: OBJECT_TYPE_AAC_LC,
            sample_rate: 78000,
            channel_count: 2,
            ..Default::default()
        };
        let enc = config.marshal()?;
        assert_eq!(AudioSpecificConfig::unmarshal(&enc)?, config);

        Ok(())
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        let configs = [
            AudioSpecificConfig {
                object_type: OBJECT_TYPE_AAC_LC,
                sample_rate: 48000,
                channel_count: 1,
                ..Default::default()
            },
            AudioSpecificConfig {
                object_type: OBJECT_TYPE_AAC_LC,
                sample_rate: 8000,
                channel_count: 8,
                frame_length_flag: true,
                ..Default::default()
            },
            AudioSpecificConfig {
                object_type: OBJECT_TYPE_AAC_LC,
                sample_rate: 44100,
                channel_count: 6,
                depends_on_core_coder: true,
                core_coder_delay: 1234,
                ..Default::default()
            },
        ];
        for config in configs {
            assert_eq!(AudioSpecificConfig::unmarshal(&config.marshal()?)?, config);
        }

        Ok(())
    }

    #[test]
    fn test_unsupported_object_type() {
        // HE-AAC (object type 5)
        assert_eq!(
            AudioSpecificConfig::unmarshal(&[0x2B, 0x92, 0x08, 0x00]),
            Err(Error::ErrUnsupportedAudioType(5))
        );
    }

    #[test]
    fn test_invalid_channel_config() {
        // object type 2, rate index 4, channel config 0
        assert_eq!(
            AudioSpecificConfig::unmarshal(&[0x12, 0x00]),
            Err(Error::ErrInvalidChannelConfig(0))
        );
    }
}
