pub mod ac3;
pub mod audio;
pub mod h264;
pub mod h265;
pub mod mpeg4_audio;
pub mod mpeg4_audio_latm;
pub mod mpeg_audio;
pub mod mpeg_ts;
pub mod vp9;

use std::collections::HashMap;

use bytes::Bytes;
use media::mpeg4audio::AudioSpecificConfig;
use shared::error::{Error, Result};

use crate::packetizer::{Depacketizer, Packetizer};

use self::ac3::{Ac3Depacketizer, Ac3Format, Ac3Packetizer};
use self::audio::{SimpleAudioDepacketizer, SimpleAudioFormat, SimpleAudioPacketizer};
use self::h264::{H264Depacketizer, H264Format, H264Packetizer};
use self::h265::{H265Depacketizer, H265Format, H265Packetizer};
use self::mpeg4_audio::{Mpeg4AudioDepacketizer, Mpeg4AudioFormat, Mpeg4AudioPacketizer};
use self::mpeg4_audio_latm::{
    Mpeg4AudioLatmDepacketizer, Mpeg4AudioLatmFormat, Mpeg4AudioLatmPacketizer,
};
use self::mpeg_audio::{MpegAudioDepacketizer, MpegAudioFormat, MpegAudioPacketizer};
use self::mpeg_ts::{MpegTsDepacketizer, MpegTsFormat, MpegTsPacketizer};
use self::vp9::{Vp9Depacketizer, Vp9Format, Vp9Packetizer};

/// A media format carried over RTP, one variant per payload family.
///
/// Instances are built either directly from the per-family configuration
/// records or from pre-split SDP attributes through [`Format::from_sdp`].
#[derive(Debug)]
pub enum Format {
    H264(H264Format),
    H265(H265Format),
    Vp9(Vp9Format),
    Mpeg4Audio(Mpeg4AudioFormat),
    Mpeg4AudioLatm(Mpeg4AudioLatmFormat),
    MpegAudio(MpegAudioFormat),
    Ac3(Ac3Format),
    MpegTs(MpegTsFormat),
    SimpleAudio(SimpleAudioFormat),
}

fn fmtp_get<'a>(fmtp: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    fmtp.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
}

fn fmtp_parse_u32(fmtp: &HashMap<String, String>, key: &str) -> Result<Option<u32>> {
    match fmtp_get(fmtp, key) {
        None => Ok(None),
        Some(v) => v.parse::<u32>().map(Some).map_err(|_| {
            Error::ErrInvalidFormatParameter(key.to_string(), v.to_string())
        }),
    }
}

fn fmtp_parse_hex(fmtp: &HashMap<String, String>, key: &str) -> Result<Option<Vec<u8>>> {
    let Some(v) = fmtp_get(fmtp, key) else {
        return Ok(None);
    };
    if v.len() % 2 != 0 {
        return Err(Error::ErrInvalidFormatParameter(
            key.to_string(),
            v.to_string(),
        ));
    }
    let mut out = Vec::with_capacity(v.len() / 2);
    for pair in v.as_bytes().chunks(2) {
        let hi = (pair[0] as char).to_digit(16);
        let lo = (pair[1] as char).to_digit(16);
        match (hi, lo) {
            (Some(hi), Some(lo)) => out.push(((hi << 4) | lo) as u8),
            _ => {
                return Err(Error::ErrInvalidFormatParameter(
                    key.to_string(),
                    v.to_string(),
                ));
            }
        }
    }
    Ok(Some(out))
}

/// Extracts the tick rate out of an SDP clock string such as "48000" or
/// "48000/2".
fn parse_clock(clock: &str) -> Result<u32> {
    let rate = clock.split('/').next().unwrap_or_default();
    rate.parse::<u32>()
        .map_err(|_| Error::ErrInvalidFormatParameter("clock".to_string(), clock.to_string()))
}

impl Format {
    /// Builds a format from pre-split SDP attributes: the rtpmap payload
    /// type, clock string and codec name, plus the fmtp parameters as a
    /// key/value map.
    ///
    /// Binary parameters that SDP conveys in base64 (H.264/H.265
    /// parameter sets) are left unset; callers decode and install them
    /// through the `safe_set_*` accessors.
    pub fn from_sdp(
        payload_type: u8,
        clock: &str,
        codec_name: &str,
        fmtp: &HashMap<String, String>,
    ) -> Result<Format> {
        let name = codec_name.to_ascii_uppercase();
        match name.as_str() {
            "H264" => {
                let mode = fmtp_parse_u32(fmtp, "packetization-mode")?.unwrap_or(0);
                if mode > 1 {
                    return Err(Error::ErrInterleavedModeUnsupported);
                }
                Ok(Format::H264(H264Format::new(
                    payload_type,
                    mode as u8,
                    None,
                    None,
                )?))
            }
            "H265" => {
                let max_don_diff = fmtp_parse_u32(fmtp, "sprop-max-don-diff")?.unwrap_or(0);
                Ok(Format::H265(H265Format::new(
                    payload_type,
                    max_don_diff,
                    None,
                    None,
                    None,
                )?))
            }
            "VP9" => Ok(Format::Vp9(Vp9Format::new(
                payload_type,
                fmtp_parse_u32(fmtp, "max-fr")?,
                fmtp_parse_u32(fmtp, "max-fs")?,
                fmtp_parse_u32(fmtp, "profile-id")?,
            ))),
            "MPEG4-GENERIC" => {
                let config = fmtp_parse_hex(fmtp, "config")?
                    .ok_or_else(|| Error::ErrMissingFormatParameter("config".to_string()))?;
                let config = AudioSpecificConfig::unmarshal(&config)?;
                let size_length = fmtp_parse_u32(fmtp, "sizelength")?
                    .ok_or_else(|| Error::ErrMissingFormatParameter("sizelength".to_string()))?;
                let index_length = fmtp_parse_u32(fmtp, "indexlength")?.unwrap_or(0);
                let index_delta_length =
                    fmtp_parse_u32(fmtp, "indexdeltalength")?.unwrap_or(0);
                Ok(Format::Mpeg4Audio(Mpeg4AudioFormat::new(
                    payload_type,
                    config,
                    size_length as usize,
                    index_length as usize,
                    index_delta_length as usize,
                )?))
            }
            "MP4A-LATM" => {
                let config = fmtp_parse_hex(fmtp, "config")?
                    .ok_or_else(|| Error::ErrMissingFormatParameter("config".to_string()))?;
                Ok(Format::Mpeg4AudioLatm(Mpeg4AudioLatmFormat::new(
                    payload_type,
                    parse_clock(clock)?,
                    Bytes::from(config),
                )?))
            }
            "MPA" => Ok(Format::MpegAudio(MpegAudioFormat::new())),
            "AC3" => Ok(Format::Ac3(Ac3Format::new(
                payload_type,
                parse_clock(clock)?,
            )?)),
            "MP2T" => Ok(Format::MpegTs(MpegTsFormat::new())),
            // Opus always travels on a 48 kHz RTP clock
            "OPUS" => Ok(Format::SimpleAudio(SimpleAudioFormat::new(
                payload_type,
                48000,
            )?)),
            // G.722 keeps its historical 8 kHz RTP clock (RFC 3551)
            "PCMU" | "PCMA" | "G722" => Ok(Format::SimpleAudio(SimpleAudioFormat::new(
                payload_type,
                8000,
            )?)),
            "L16" | "L24" => Ok(Format::SimpleAudio(SimpleAudioFormat::new(
                payload_type,
                parse_clock(clock)?,
            )?)),
            _ => Err(Error::ErrUnsupportedCodec(codec_name.to_string())),
        }
    }

    pub fn payload_type(&self) -> u8 {
        match self {
            Format::H264(f) => f.payload_type(),
            Format::H265(f) => f.payload_type(),
            Format::Vp9(f) => f.payload_type,
            Format::Mpeg4Audio(f) => f.payload_type,
            Format::Mpeg4AudioLatm(f) => f.payload_type,
            Format::MpegAudio(f) => f.payload_type(),
            Format::Ac3(f) => f.payload_type,
            Format::MpegTs(f) => f.payload_type(),
            Format::SimpleAudio(f) => f.payload_type,
        }
    }

    pub fn clock_rate(&self) -> u32 {
        match self {
            Format::H264(f) => f.clock_rate(),
            Format::H265(f) => f.clock_rate(),
            Format::Vp9(f) => f.clock_rate(),
            Format::Mpeg4Audio(f) => f.clock_rate(),
            Format::Mpeg4AudioLatm(f) => f.clock_rate(),
            Format::MpegAudio(f) => f.clock_rate(),
            Format::Ac3(f) => f.clock_rate(),
            Format::MpegTs(f) => f.clock_rate(),
            Format::SimpleAudio(f) => f.clock_rate(),
        }
    }

    /// Builds a packetizer for this format with random SSRC, initial
    /// sequence number and timestamp offset.
    pub fn packetizer(&self) -> Box<dyn Packetizer + Send> {
        match self {
            Format::H264(f) => Box::new(H264Packetizer::new(
                f.payload_type(),
                None,
                None,
                None,
                None,
            )),
            Format::H265(f) => Box::new(H265Packetizer::new(
                f.payload_type(),
                None,
                None,
                None,
                None,
            )),
            Format::Vp9(f) => Box::new(Vp9Packetizer::new(
                f.payload_type,
                None,
                None,
                None,
                None,
                None,
            )),
            Format::Mpeg4Audio(f) => Box::new(Mpeg4AudioPacketizer::new(
                f.payload_type,
                f.size_length,
                f.index_length,
                f.index_delta_length,
                None,
                None,
                None,
                None,
            )),
            Format::Mpeg4AudioLatm(f) => Box::new(Mpeg4AudioLatmPacketizer::new(
                f.payload_type,
                None,
                None,
                None,
                None,
            )),
            Format::MpegAudio(_) => Box::new(MpegAudioPacketizer::new(None, None, None, None)),
            Format::Ac3(f) => Box::new(Ac3Packetizer::new(
                f.payload_type,
                None,
                None,
                None,
                None,
            )),
            Format::MpegTs(_) => Box::new(MpegTsPacketizer::new(None, None, None, None)),
            Format::SimpleAudio(f) => Box::new(SimpleAudioPacketizer::new(
                f.payload_type,
                None,
                None,
                None,
                None,
            )),
        }
    }

    /// Builds a depacketizer for this format.
    pub fn depacketizer(&self) -> Box<dyn Depacketizer + Send> {
        match self {
            Format::H264(_) => Box::new(H264Depacketizer::new()),
            Format::H265(_) => Box::new(H265Depacketizer::new()),
            Format::Vp9(_) => Box::new(Vp9Depacketizer::new()),
            Format::Mpeg4Audio(f) => Box::new(Mpeg4AudioDepacketizer::new(
                f.size_length,
                f.index_length,
                f.index_delta_length,
            )),
            Format::Mpeg4AudioLatm(_) => Box::new(Mpeg4AudioLatmDepacketizer::new()),
            Format::MpegAudio(_) => Box::new(MpegAudioDepacketizer::new()),
            Format::Ac3(_) => Box::new(Ac3Depacketizer::new()),
            Format::MpegTs(_) => Box::new(MpegTsDepacketizer::new()),
            Format::SimpleAudio(_) => Box::new(SimpleAudioDepacketizer::new()),
        }
    }
}
