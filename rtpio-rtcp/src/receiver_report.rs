use std::fmt;

use bytes::{Buf, Bytes};
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal};

use crate::header::{COUNT_MAX, HEADER_LENGTH, Header, PacketType};
use crate::reception_report::{RECEPTION_REPORT_LENGTH, ReceptionReport};

const RR_SSRC_LENGTH: usize = 4;

/// An RTCP ReceiverReport (PT=201): reception statistics from a
/// participant that is not an active sender (RFC 3550 section 6.4.2).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiverReport {
    /// Synchronization source of the packet originator.
    pub ssrc: u32,
    /// Zero or more reception report blocks.
    pub reports: Vec<ReceptionReport>,
    /// Additional payload-specific information, left opaque.
    pub profile_extensions: Bytes,
}

impl ReceiverReport {
    pub fn header(&self) -> Header {
        Header {
            padding: false,
            count: self.reports.len() as u8,
            packet_type: PacketType::ReceiverReport,
            length: ((self.marshal_size() / 4) - 1) as u16,
        }
    }
}

impl MarshalSize for ReceiverReport {
    fn marshal_size(&self) -> usize {
        HEADER_LENGTH
            + RR_SSRC_LENGTH
            + self.reports.len() * RECEPTION_REPORT_LENGTH
            + self.profile_extensions.len()
    }
}

impl Marshal for ReceiverReport {
    fn marshal_to(&self, buf: &mut [u8]) -> Result<usize> {
        if self.reports.len() > COUNT_MAX {
            return Err(Error::TooManyReports);
        }
        if buf.len() < self.marshal_size() {
            return Err(Error::ErrBufferTooSmall);
        }

        let mut n = self.header().marshal_to(buf)?;

        buf[n..n + 4].copy_from_slice(&self.ssrc.to_be_bytes());
        n += RR_SSRC_LENGTH;

        for report in &self.reports {
            n += report.marshal_to(&mut buf[n..])?;
        }

        buf[n..n + self.profile_extensions.len()].copy_from_slice(&self.profile_extensions);
        n += self.profile_extensions.len();

        Ok(n)
    }
}

impl Unmarshal for ReceiverReport {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        let header = Header::unmarshal(raw_packet)?;
        if header.packet_type != PacketType::ReceiverReport {
            return Err(Error::WrongType);
        }
        if raw_packet.remaining() < RR_SSRC_LENGTH {
            return Err(Error::PacketTooShort);
        }

        let ssrc = raw_packet.get_u32();

        let mut reports = Vec::with_capacity(header.count as usize);
        for _ in 0..header.count {
            reports.push(ReceptionReport::unmarshal(raw_packet)?);
        }
        let profile_extensions = raw_packet.copy_to_bytes(raw_packet.remaining());

        Ok(ReceiverReport {
            ssrc,
            reports,
            profile_extensions,
        })
    }
}

impl fmt::Display for ReceiverReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = format!("ReceiverReport from {}\n", self.ssrc);
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
