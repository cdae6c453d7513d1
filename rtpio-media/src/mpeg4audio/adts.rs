use bytes::Bytes;
use shared::error::{Error, Result};

use crate::mpeg4audio::{
    OBJECT_TYPE_AAC_LC, SAMPLE_RATES, channel_config, channel_count, sample_rate_index,
};

/// Size of an ADTS header without CRC.
const ADTS_HEADER_LENGTH: usize = 7;

/// One ADTS-framed AAC access unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdtsPacket {
    pub object_type: u8,
    pub sample_rate: u32,
    pub channel_count: u8,
    pub au: Bytes,
}

/// Parses a buffer holding one or more complete ADTS packets.
pub fn unmarshal(buf: &[u8]) -> Result<Vec<AdtsPacket>> {
    let mut out = Vec::new();
    let mut pos = 0;

    loop {
        let rem = &buf[pos..];
        if rem.len() < ADTS_HEADER_LENGTH + 1 {
            return Err(Error::ErrShortPacket);
        }

        if rem[0] != 0xFF || (rem[1] >> 4) != 0x0F {
            return Err(Error::ErrAdtsInvalidSyncword);
        }
        if (rem[1] & 0x01) != 0x01 {
            return Err(Error::ErrAdtsCrcUnsupported);
        }

        let object_type = (rem[2] >> 6) + 1;
        if object_type != OBJECT_TYPE_AAC_LC {
            return Err(Error::ErrUnsupportedAudioType(object_type));
        }

        let sample_rate_index = (rem[2] >> 2) & 0x0F;
        if sample_rate_index as usize >= SAMPLE_RATES.len() {
            return Err(Error::ErrInvalidSampleRateIndex(sample_rate_index));
        }
        let sample_rate = SAMPLE_RATES[sample_rate_index as usize];

        let channel_config_field = ((rem[2] & 0x01) << 2) | (rem[3] >> 6);
        let channel_count = channel_count(channel_config_field)
            .ok_or(Error::ErrInvalidChannelConfig(channel_config_field))?;

        let frame_count = rem[6] & 0x03;
        if frame_count != 0 {
            return Err(Error::ErrAdtsMultipleFramesUnsupported);
        }

        let frame_length = (usize::from(rem[3] & 0x03) << 11)
            | (usize::from(rem[4]) << 3)
            | usize::from(rem[5] >> 5);
        if frame_length <= ADTS_HEADER_LENGTH || frame_length > rem.len() {
            return Err(Error::ErrAdtsInvalidFrameLength);
        }

        out.push(AdtsPacket {
            object_type,
            sample_rate,
            channel_count,
            au: Bytes::copy_from_slice(&rem[ADTS_HEADER_LENGTH..frame_length]),
        });
        pos += frame_length;

        if pos == buf.len() {
            return Ok(out);
        }
    }
}

/// Encodes packets into ADTS frames. The buffer-fullness field is set to
/// 0x7FF, "variable bitrate".
pub fn marshal(pkts: &[AdtsPacket]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(
        pkts.iter()
            .map(|p| ADTS_HEADER_LENGTH + p.au.len())
            .sum(),
    );

    for pkt in pkts {
        if pkt.object_type != OBJECT_TYPE_AAC_LC {
            return Err(Error::ErrUnsupportedAudioType(pkt.object_type));
        }
        let freq_index =
            sample_rate_index(pkt.sample_rate).ok_or(Error::ErrInvalidSampleRate(pkt.sample_rate))?;
        let channel_config_field = channel_config(pkt.channel_count)
            .ok_or(Error::ErrInvalidChannelConfig(pkt.channel_count))?;

        let frame_length = ADTS_HEADER_LENGTH + pkt.au.len();
        if frame_length > (1 << 13) - 1 {
            return Err(Error::ErrAdtsInvalidFrameLength);
        }

        out.push(0xFF);
        out.push(0xF1); // MPEG-4, layer 0, no CRC
        out.push(((pkt.object_type - 1) << 6) | (freq_index << 2) | (channel_config_field >> 2));
        out.push(((channel_config_field & 0x03) << 6) | ((frame_length >> 11) as u8 & 0x03));
        out.push((frame_length >> 3) as u8);
        out.push(((frame_length as u8 & 0x07) << 5) | 0x1F);
        out.push(0xFC);
        out.extend_from_slice(&pkt.au);
    }

    Ok(out)
}
