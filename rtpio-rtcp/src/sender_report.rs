use std::fmt;

use bytes::{Buf, Bytes};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::header::{COUNT_MAX, HEADER_LENGTH, Header, PacketType};
use crate::reception_report::{RECEPTION_REPORT_LENGTH, ReceptionReport};

/// Size of the sender-info section that follows the header.
pub(crate) const SR_SENDER_INFO_LENGTH: usize = 24;

/// An RTCP SenderReport (PT=200): transmission statistics from an active
/// sender, plus reception reports for the streams it receives
/// (RFC 3550 section 6.4.1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderReport {
    /// Synchronization source of the sender originating this report.
    pub ssrc: u32,
    /// Wallclock time when this report was sent, in NTP 32.32 fixed point.
    pub ntp_time: u64,
    /// The same instant expressed in RTP timestamp units of the stream.
    pub rtp_time: u32,
    /// Total RTP data packets transmitted since the start of transmission.
    pub packet_count: u32,
    /// Total payload octets transmitted since the start of transmission.
    pub octet_count: u32,
    /// Zero or more reception report blocks.
    pub reports: Vec<ReceptionReport>,
    /// Additional payload-specific information, left opaque.
    pub profile_extensions: Bytes,
}

impl SenderReport {
    pub fn header(&self) -> Header {
        Header {
            padding: false,
            count: self.reports.len() as u8,
            packet_type: PacketType::SenderReport,
            length: ((self.marshal_size() / 4) - 1) as u16,
        }
    }
}

impl MarshalSize for SenderReport {
    fn marshal_size(&self) -> usize {
        HEADER_LENGTH
            + SR_SENDER_INFO_LENGTH
            + self.reports.len() * RECEPTION_REPORT_LENGTH
            + self.profile_extensions.len()
    }
}

impl Marshal for SenderReport {
    fn marshal_to(&self, buf: &mut [u8]) -> Result<usize> {
        if self.reports.len() > COUNT_MAX {
            return Err(Error::TooManyReports);
        }
        if buf.len() < self.marshal_size() {
            return Err(Error::ErrBufferTooSmall);
        }

        let mut n = self.header().marshal_to(buf)?;

        buf[n..n + 4].copy_from_slice(&self.ssrc.to_be_bytes());
        buf[n + 4..n + 12].copy_from_slice(&self.ntp_time.to_be_bytes());
        buf[n + 12..n + 16].copy_from_slice(&self.rtp_time.to_be_bytes());
        buf[n + 16..n + 20].copy_from_slice(&self.packet_count.to_be_bytes());
        buf[n + 20..n + 24].copy_from_slice(&self.octet_count.to_be_bytes());
        n += SR_SENDER_INFO_LENGTH;

        for report in &self.reports {
            n += report.marshal_to(&mut buf[n..])?;
        }

        buf[n..n + self.profile_extensions.len()].copy_from_slice(&self.profile_extensions);
        n += self.profile_extensions.len();

        Ok(n)
    }
}

impl Unmarshal for SenderReport {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        let header = Header::unmarshal(raw_packet)?;
        if header.packet_type != PacketType::SenderReport {
            return Err(Error::WrongType);
        }
        if raw_packet.remaining() < SR_SENDER_INFO_LENGTH {
            return Err(Error::PacketTooShort);
        }

        let ssrc = raw_packet.get_u32();
        let ntp_time = raw_packet.get_u64();
        let rtp_time = raw_packet.get_u32();
        let packet_count = raw_packet.get_u32();
        let octet_count = raw_packet.get_u32();

        let mut reports = Vec::with_capacity(header.count as usize);
        for _ in 0..header.count {
            reports.push(ReceptionReport::unmarshal(raw_packet)?);
        }
        let profile_extensions = raw_packet.copy_to_bytes(raw_packet.remaining());

        Ok(SenderReport {
            ssrc,
            ntp_time,
            rtp_time,
            packet_count,
            octet_count,
            reports,
            profile_extensions,
        })
    }
}

impl fmt::Display for SenderReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = format!("SenderReport from {}\n", self.ssrc);
        out += format!("\tNTPTime:\t{}\n", self.ntp_time).as_str();
        out += format!("\tRTPTime:\t{}\n", self.rtp_time).as_str();
        out += format!("\tPacketCount:\t{}\n", self.packet_count).as_str();
        out += format!("\tOctetCount:\t{}\n", self.octet_count).as_str();
        out += "\tSSRC    \tLost\tLastSequence\n";
        for rep in &self.reports {
            out += format!(
                "\t{:x}\t{}/{}\t{}\n",
                rep.ssrc, rep.fraction_lost, rep.total_lost, rep.last_sequence_number
            )
            .as_str();
        }

        write!(f, "{out}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SenderReport {
        SenderReport {
            ssrc: 0x902F9E2E,
            ntp_time: 0xDA8BD1FC_DDDDA05A,
            rtp_time: 1287987768,
            packet_count: 1_817,
            octet_count: 1_236_716,
            reports: vec![ReceptionReport {
                ssrc: 0xBC5E9A40,
                fraction_lost: 0,
                total_lost: 0,
                last_sequence_number: 0x0004_6050,
                jitter: 273,
                last_sender_report: 0x56789ABC,
                delay: 65536,
            }],
            profile_extensions: Bytes::new(),
        }
    }

    #[test]
    fn test_sender_report_round_trip() -> Result<()> {
        let sr = sample();
        let raw = sr.marshal()?;
        assert_eq!(raw.len(), sr.marshal_size());
        assert_eq!(SenderReport::unmarshal(&mut raw.clone())?, sr);

        Ok(())
    }

    #[test]
    fn test_sender_report_header() -> Result<()> {
        let sr = sample();
        let h = sr.header();
        assert_eq!(h.count, 1);
        assert_eq!(h.packet_type, PacketType::SenderReport);
        // 4 + 24 + 24 bytes = 13 words, minus one
        assert_eq!(h.length, 12);

        Ok(())
    }

    #[test]
    fn test_sender_report_wrong_type() -> Result<()> {
        let sr = sample();
        let mut raw = sr.marshal()?.to_vec();
        raw[1] = 201;
        assert_eq!(
            SenderReport::unmarshal(&mut Bytes::from(raw)),
            Err(Error::WrongType)
        );

        Ok(())
    }

    #[test]
    fn test_sender_report_truncated() {
        let raw = Bytes::from_static(&[0x80, 0xC8, 0x00, 0x06, 0x90, 0x2F]);
        assert_eq!(
            SenderReport::unmarshal(&mut raw.clone()),
            Err(Error::PacketTooShort)
        );
    }
}
