use bytes::Bytes;
use shared::error::{Error, Result};
use shared::marshal::{Marshal, Unmarshal};

use crate::header::{HEADER_LENGTH, Header, PacketType};
use crate::receiver_report::ReceiverReport;
use crate::sender_report::SenderReport;

/// An RTCP packet this crate emits or ingests. Other packet types found
/// inside a compound (SDES, BYE, APP) are skipped during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtcpPacket {
    SenderReport(SenderReport),
    ReceiverReport(ReceiverReport),
}

impl RtcpPacket {
    pub fn marshal(&self) -> Result<Bytes> {
        match self {
            RtcpPacket::SenderReport(sr) => sr.marshal(),
            RtcpPacket::ReceiverReport(rr) => rr.marshal(),
        }
    }
}

/// Splits a compound RTCP datagram into its packets, parsing sender and
/// receiver reports and skipping everything else by declared length.
pub fn unmarshal_compound(raw: &Bytes) -> Result<Vec<RtcpPacket>> {
    let mut out = Vec::new();
    let mut offset = 0;

    while offset < raw.len() {
        if raw.len() - offset < HEADER_LENGTH {
            return Err(Error::PacketTooShort);
        }
        let header = Header::unmarshal(&mut raw.slice(offset..))?;
        let total = (header.length as usize + 1) * 4;
        if offset + total > raw.len() {
            return Err(Error::PacketTooShort);
        }
        let body = raw.slice(offset..offset + total);

        match header.packet_type {
            PacketType::SenderReport => {
                out.push(RtcpPacket::SenderReport(SenderReport::unmarshal(
                    &mut body.clone(),
                )?));
            }
            PacketType::ReceiverReport => {
                out.push(RtcpPacket::ReceiverReport(ReceiverReport::unmarshal(
                    &mut body.clone(),
                )?));
            }
            _ => {}
        }

        offset += total;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::reception_report::ReceptionReport;

    #[test]
    fn test_compound_sr_plus_sdes() -> Result<()> {
        let sr = SenderReport {
            ssrc: 1,
            ntp_time: 2,
            rtp_time: 3,
            packet_count: 4,
            octet_count: 5,
            ..Default::default()
        };

        let mut compound = BytesMut::new();
        compound.extend_from_slice(&sr.marshal()?);
        // minimal SDES with one empty chunk, skipped by the parser
        compound.put_slice(&[0x81, 0xCA, 0x00, 0x01, 0x00, 0x00, 0x00, 0x09]);

        let parsed = unmarshal_compound(&compound.freeze())?;
        assert_eq!(parsed, vec![RtcpPacket::SenderReport(sr)]);

        Ok(())
    }

    #[test]
    fn test_compound_rr() -> Result<()> {
        let rr = ReceiverReport {
            ssrc: 9,
            reports: vec![ReceptionReport {
                ssrc: 10,
                ..Default::default()
            }],
            ..Default::default()
        };
        let raw = rr.marshal()?;

        let parsed = unmarshal_compound(&raw)?;
        assert_eq!(parsed, vec![RtcpPacket::ReceiverReport(rr)]);

        Ok(())
    }

    #[test]
    fn test_compound_truncated() {
        let raw = Bytes::from_static(&[0x80, 0xC8, 0x00, 0x06, 0x00, 0x00]);
        assert_eq!(unmarshal_compound(&raw), Err(Error::PacketTooShort));
    }
}
