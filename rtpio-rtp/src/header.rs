#[cfg(test)]
mod header_test;

use bytes::{Buf, Bytes};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal};

/// Size of the fixed part of the RTP header.
pub const HEADER_LENGTH: usize = 12;
/// The only RTP version this crate speaks.
pub const VERSION: u8 = 2;
/// A header carries at most 15 CSRC entries (4-bit CC field).
pub const CSRC_MAX: usize = 15;

const VERSION_SHIFT: u8 = 6;
const PADDING_MASK: u8 = 0x20;
const EXTENSION_MASK: u8 = 0x10;
const CC_MASK: u8 = 0x0F;
const MARKER_MASK: u8 = 0x80;
const PT_MASK: u8 = 0x7F;

/// RTP packet header (RFC 3550 section 5.1) with an optional
/// profile-defined extension (section 5.3.1).
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|X|  CC   |M|     PT      |       sequence number         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           timestamp                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           synchronization source (SSRC) identifier            |
/// +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
/// |            contributing source (CSRC) identifiers             |
/// |                             ....                              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub padding: bool,
    pub extension: bool,
    pub marker: bool,
    pub payload_type: u8,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    pub csrc: Vec<u32>,
    /// Profile identifier of the single RFC 3550 extension, meaningful only
    /// when `extension` is set.
    pub extension_profile: u16,
    /// Extension contents, a whole number of 32-bit words.
    pub extension_payload: Option<Bytes>,
}

impl Default for Header {
    fn default() -> Self {
        Header {
            version: VERSION,
            padding: false,
            extension: false,
            marker: false,
            payload_type: 0,
            sequence_number: 0,
            timestamp: 0,
            ssrc: 0,
            csrc: vec![],
            extension_profile: 0,
            extension_payload: None,
        }
    }
}

impl MarshalSize for Header {
    fn marshal_size(&self) -> usize {
        let mut n = HEADER_LENGTH + 4 * self.csrc.len();
        if self.extension {
            n += 4 + self
                .extension_payload
                .as_ref()
                .map(|p| p.len())
                .unwrap_or_default();
        }
        n
    }
}

impl Unmarshal for Header {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_packet.remaining() < HEADER_LENGTH {
            return Err(Error::ErrHeaderSizeInsufficient);
        }

        let b0 = raw_packet.get_u8();
        let version = b0 >> VERSION_SHIFT;
        if version != VERSION {
            return Err(Error::ErrBadRtpVersion);
        }
        let padding = (b0 & PADDING_MASK) != 0;
        let extension = (b0 & EXTENSION_MASK) != 0;
        let cc = (b0 & CC_MASK) as usize;

        let b1 = raw_packet.get_u8();
        let marker = (b1 & MARKER_MASK) != 0;
        let payload_type = b1 & PT_MASK;

        let sequence_number = raw_packet.get_u16();
        let timestamp = raw_packet.get_u32();
        let ssrc = raw_packet.get_u32();

        if raw_packet.remaining() < 4 * cc {
            return Err(Error::ErrHeaderSizeInsufficient);
        }
        let mut csrc = Vec::with_capacity(cc);
        for _ in 0..cc {
            csrc.push(raw_packet.get_u32());
        }

        let (extension_profile, extension_payload) = if extension {
            if raw_packet.remaining() < 4 {
                return Err(Error::ErrHeaderSizeInsufficientForExtension);
            }
            let profile = raw_packet.get_u16();
            let length = raw_packet.get_u16() as usize * 4;
            if raw_packet.remaining() < length {
                return Err(Error::ErrHeaderSizeInsufficientForExtension);
            }
            (profile, Some(raw_packet.copy_to_bytes(length)))
        } else {
            (0, None)
        };

        Ok(Header {
            version,
            padding,
            extension,
            marker,
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
            csrc,
            extension_profile,
            extension_payload,
        })
    }
}

impl Marshal for Header {
    fn marshal_to(&self, buf: &mut [u8]) -> Result<usize> {
        let size = self.marshal_size();
        if buf.len() < size {
            return Err(Error::ErrBufferTooSmall);
        }
        if self.csrc.len() > CSRC_MAX {
            return Err(Error::ErrTooManyCsrc);
        }

        let mut b0 = VERSION << VERSION_SHIFT;
        if self.padding {
            b0 |= PADDING_MASK;
        }
        if self.extension {
            b0 |= EXTENSION_MASK;
        }
        b0 |= self.csrc.len() as u8;
        buf[0] = b0;

        let mut b1 = self.payload_type & PT_MASK;
        if self.marker {
            b1 |= MARKER_MASK;
        }
        buf[1] = b1;

        buf[2..4].copy_from_slice(&self.sequence_number.to_be_bytes());
        buf[4..8].copy_from_slice(&self.timestamp.to_be_bytes());
        buf[8..12].copy_from_slice(&self.ssrc.to_be_bytes());

        let mut n = HEADER_LENGTH;
        for csrc in &self.csrc {
            buf[n..n + 4].copy_from_slice(&csrc.to_be_bytes());
            n += 4;
        }

        if self.extension {
            let payload = self
                .extension_payload
                .as_deref()
                .unwrap_or_default();
            if payload.len() % 4 != 0 {
                return Err(Error::HeaderExtensionPayloadNot32BitWords);
            }
            buf[n..n + 2].copy_from_slice(&self.extension_profile.to_be_bytes());
            buf[n + 2..n + 4].copy_from_slice(&((payload.len() / 4) as u16).to_be_bytes());
            n += 4;
            buf[n..n + payload.len()].copy_from_slice(payload);
            n += payload.len();
        }

        Ok(n)
    }
}
