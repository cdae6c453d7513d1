use bytes::Buf;
use shared::error::{Error, Result};
use shared::marshal::{Marshal, MarshalSize, Unmarshal};

/// Size of one reception report block.
pub const RECEPTION_REPORT_LENGTH: usize = 24;

/// Maximum value of the 24-bit cumulative-lost counter.
pub const TOTAL_LOST_MAX: u32 = 0xFF_FFFF;

/// One reception report block, carried inside sender and receiver reports
/// (RFC 3550 section 6.4.1).
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 SSRC_1 (SSRC of first source)                 |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// | fraction lost |       cumulative number of packets lost       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           extended highest sequence number received           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                      interarrival jitter                      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         last SR (LSR)                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                   delay since last SR (DLSR)                  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceptionReport {
    /// The SSRC of the source this report is about.
    pub ssrc: u32,
    /// Fraction of packets lost since the previous report, as a fixed-point
    /// number with the binary point at the left edge.
    pub fraction_lost: u8,
    /// Cumulative number of packets lost, a 24-bit signed-saturating
    /// counter.
    pub total_lost: u32,
    /// Sequence number cycles in the upper 16 bits, highest received
    /// sequence number in the lower 16.
    pub last_sequence_number: u32,
    /// Interarrival jitter estimate in timestamp units.
    pub jitter: u32,
    /// Middle 32 bits of the NTP timestamp of the most recent sender
    /// report.
    pub last_sender_report: u32,
    /// Delay between receiving that sender report and sending this block,
    /// in 1/65536-second units.
    pub delay: u32,
}

impl MarshalSize for ReceptionReport {
    fn marshal_size(&self) -> usize {
        RECEPTION_REPORT_LENGTH
    }
}

impl Marshal for ReceptionReport {
    fn marshal_to(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < RECEPTION_REPORT_LENGTH {
            return Err(Error::ErrBufferTooSmall);
        }
        if self.total_lost > TOTAL_LOST_MAX {
            return Err(Error::InvalidTotalLost);
        }

        buf[0..4].copy_from_slice(&self.ssrc.to_be_bytes());
        buf[4] = self.fraction_lost;
        buf[5..8].copy_from_slice(&self.total_lost.to_be_bytes()[1..4]);
        buf[8..12].copy_from_slice(&self.last_sequence_number.to_be_bytes());
        buf[12..16].copy_from_slice(&self.jitter.to_be_bytes());
        buf[16..20].copy_from_slice(&self.last_sender_report.to_be_bytes());
        buf[20..24].copy_from_slice(&self.delay.to_be_bytes());

        Ok(RECEPTION_REPORT_LENGTH)
    }
}

impl Unmarshal for ReceptionReport {
    fn unmarshal<B>(raw_packet: &mut B) -> Result<Self>
    where
        Self: Sized,
        B: Buf,
    {
        if raw_packet.remaining() < RECEPTION_REPORT_LENGTH {
            return Err(Error::PacketTooShort);
        }

        let ssrc = raw_packet.get_u32();
        let word = raw_packet.get_u32();
        let fraction_lost = (word >> 24) as u8;
        let total_lost = word & TOTAL_LOST_MAX;
        let last_sequence_number = raw_packet.get_u32();
        let jitter = raw_packet.get_u32();
        let last_sender_report = raw_packet.get_u32();
        let delay = raw_packet.get_u32();

        Ok(ReceptionReport {
            ssrc,
            fraction_lost,
            total_lost,
            last_sequence_number,
            jitter,
            last_sender_report,
            delay,
        })
    }
}
