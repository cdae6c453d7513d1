use bytes::Buf;
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal};

/// Size of an RTCP packet header.
pub const HEADER_LENGTH: usize = 4;
/// The RTCP version handled by this crate.
pub const VERSION: u8 = 2;
/// Maximum value of the 5-bit report/source count field.
pub const COUNT_MAX: usize = (1 << 5) - 1;

pub(crate) const VERSION_SHIFT: u8 = 6;
pub(crate) const PADDING_MASK: u8 = 0x20;
pub(crate) const COUNT_MASK: u8 = 0x1F;

/// RTCP packet types registered in RFC 3550.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum PacketType {
    #[default]
    Unsupported = 0,
    SenderReport = 200,
    ReceiverReport = 201,
    SourceDescription = 202,
    Goodbye = 203,
}

impl From<u8> for PacketType {
    fn from(b: u8) -> Self {
        match b {
            200 => PacketType::SenderReport,
            201 => PacketType::ReceiverReport,
            202 => PacketType::SourceDescription,
            203 => PacketType::Goodbye,
            _ => PacketType::Unsupported,
        }
    }
}

/// The common first word of every RTCP packet.
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|    RC   |  packet type  |             length            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// Padding flag: the packet ends with padding octets.
    pub padding: bool,
    /// Number of reception reports (or sources) in this packet.
    pub count: u8,
    pub packet_type: PacketType,
    /// Packet length in 32-bit words minus one, header included.
    pub length: u16,
}

impl MarshalSize for Header {
    fn marshal_size(&self) -> usize {
        HEADER_LENGTH
    }
}

impl Marshal for Header {
    fn marshal_to(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < HEADER_LENGTH {
            return Err(Error::ErrBufferTooSmall);
        }
        if self.count as usize > COUNT_MAX {
            return Err(Error::InvalidHeader);
        }

        let mut b0 = VERSION << VERSION_SHIFT;
        if self.padding {
            b0 |= PADDING_MASK;
        }
        b0 |= self.count & COUNT_MASK;

        buf[0] = b0;
        buf[1] = self.packet_type as u8;
        buf[2..4].copy_from_slice(&self.length.to_be_bytes());

        Ok(HEADER_LENGTH)
    }
}

impl Unmarshal for Header {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_packet.remaining() < HEADER_LENGTH {
            return Err(Error::PacketTooShort);
        }

        let b0 = raw_packet.get_u8();
        if (b0 >> VERSION_SHIFT) != VERSION {
            return Err(Error::BadVersion);
        }

        Ok(Header {
            padding: (b0 & PADDING_MASK) != 0,
            count: b0 & COUNT_MASK,
            packet_type: PacketType::from(raw_packet.get_u8()),
            length: raw_packet.get_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn test_header_round_trip() -> Result<()> {
        let h = Header {
            padding: false,
            count: 1,
            packet_type: PacketType::SenderReport,
            length: 7,
        };
        let raw = h.marshal()?;
        assert_eq!(raw, Bytes::from_static(&[0x81, 0xC8, 0x00, 0x07]));
        assert_eq!(Header::unmarshal(&mut raw.clone())?, h);

        Ok(())
    }

    #[test]
    fn test_header_bad_version() {
        let raw = Bytes::from_static(&[0x01, 0xC8, 0x00, 0x07]);
        assert_eq!(Header::unmarshal(&mut raw.clone()), Err(Error::BadVersion));
    }

    #[test]
    fn test_header_too_many_reports() {
        let h = Header {
            count: 40,
            packet_type: PacketType::ReceiverReport,
            ..Default::default()
        };
        assert_eq!(h.marshal(), Err(Error::InvalidHeader));
    }
}
