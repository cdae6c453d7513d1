
use std::fmt;

use bytes::{Buf, Bytes};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::header::Header;

/// An RTP packet: header, payload, and trailing padding.
///
/// `padding_size` counts the padding octets including the final length
/// octet; it is non-zero iff the header's padding flag is set.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: Header,
    pub payload: Bytes,
    pub padding_size: u8,
}

impl MarshalSize for Packet {
    fn marshal_size(&self) -> usize {
        self.header.marshal_size() + self.payload.len() + self.padding_size as usize
    }
}

impl Unmarshal for Packet {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        let header = Header::unmarshal(raw_packet)?;

        let remaining = raw_packet.remaining();
        if header.padding {
            if remaining == 0 {
                return Err(Error::ErrShortPacket);
            }
            let mut body = raw_packet.copy_to_bytes(remaining);
            let size = body[remaining - 1];
            if size == 0 || size as usize > remaining {
                return Err(Error::ErrBadPaddingSize);
            }
            let payload = body.split_to(remaining - size as usize);
            Ok(Packet {
                header,
                payload,
                padding_size: size,
            })
        } else {
            Ok(Packet {
                header,
                payload: raw_packet.copy_to_bytes(remaining),
                padding_size: 0,
            })
        }
    }
}

impl Marshal for Packet {
    fn marshal_to(&self, buf: &mut [u8]) -> Result<usize> {
        if self.padding_size as usize != 0 && !self.header.padding {
            return Err(Error::ErrBadPaddingSize);
        }

        let mut n = self.header.marshal_to(buf)?;
        if buf.len() < n + self.payload.len() + self.padding_size as usize {
            return Err(Error::ErrBufferTooSmall);
        }

        buf[n..n + self.payload.len()].copy_from_slice(&self.payload);
        n += self.payload.len();

        if self.padding_size > 0 {
            for b in buf.iter_mut().skip(n).take(self.padding_size as usize - 1) {
                *b = 0;
            }
            buf[n + self.padding_size as usize - 1] = self.padding_size;
            n += self.padding_size as usize;
        }

        Ok(n)
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = "RTP PACKET:\n".to_string();

        out += format!("\tVersion: {}\n", self.header.version).as_str();
        out += format!("\tMarker: {}\n", self.header.marker).as_str();
        out += format!("\tPayload Type: {}\n", self.header.payload_type).as_str();
        out += format!("\tSequence Number: {}\n", self.header.sequence_number).as_str();
        out += format!("\tTimestamp: {}\n", self.header.timestamp).as_str();
        out += format!("\tSSRC: {} ({:x})\n", self.header.ssrc, self.header.ssrc).as_str();
        out += format!("\tPayload Length: {}\n", self.payload.len()).as_str();

        write!(f, "{out}")
    }
}

impl Packet {
    /// Clears the padding flag and drops the padding octets.
    pub fn strip_padding(&mut self) {
        self.header.padding = false;
        self.padding_size = 0;
    }
}
