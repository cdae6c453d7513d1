use std::time::{Duration, Instant, SystemTime};

use rtcp::receiver_report::ReceiverReport;
use rtcp::reception_report::{ReceptionReport, TOTAL_LOST_MAX};
use rtcp::sender_report::SenderReport;
use rtp::packet::Packet;
use shared::error::{Error, Result};
use shared::time::{ntp2unix, ntp_middle_32};

use crate::reorderer::Reorderer;

/// Receive-side bookkeeping for one RTP stream.
///
/// Incoming packets pass through a reordering buffer; losses, sequence
/// cycles and RFC 3550 interarrival jitter are accounted on the way.
/// Ingested sender reports anchor the RTP timeline to the sender's wall
/// clock, and a receiver report is synthesized on every timeout tick.
///
/// Time is injected: callers pass `now` into every operation, so tests
/// drive the clock directly.
#[derive(Debug)]
pub struct RtcpReceiver {
    clock_rate: u32,
    local_ssrc: u32,
    interval: Duration,
    eto: Instant,

    reorderer: Reorderer,
    remote_ssrc: Option<u32>,

    first_rtp_seen: bool,
    seq_cycles: u16,
    last_seq: u16,
    last_rtp_ts: u32,
    last_rtp_time: Option<Instant>,

    total_lost: u32,
    total_lost_since_report: u32,
    total_since_report: u32,
    jitter: f64,

    last_sr_ntp: Option<u64>,
    last_sr_rtp: u32,
    last_sr_time: Option<Instant>,
}

impl RtcpReceiver {
    pub fn new(
        clock_rate: u32,
        local_ssrc: Option<u32>,
        interval: Duration,
        now: Instant,
    ) -> Result<Self> {
        if clock_rate == 0 {
            return Err(Error::ErrZeroClockRate);
        }
        Ok(RtcpReceiver {
            clock_rate,
            local_ssrc: local_ssrc.unwrap_or_else(rand::random::<u32>),
            interval,
            eto: now + interval,
            reorderer: Reorderer::default(),
            remote_ssrc: None,
            first_rtp_seen: false,
            seq_cycles: 0,
            last_seq: 0,
            last_rtp_ts: 0,
            last_rtp_time: None,
            total_lost: 0,
            total_lost_since_report: 0,
            total_since_report: 0,
            jitter: 0.0,
            last_sr_ntp: None,
            last_sr_rtp: 0,
            last_sr_time: None,
        })
    }

    pub fn local_ssrc(&self) -> u32 {
        self.local_ssrc
    }

    /// SSRC of the remote stream, fixed by the first received packet.
    pub fn remote_ssrc(&self) -> Option<u32> {
        self.remote_ssrc
    }

    /// Feeds one received packet. Returns the packets deliverable in
    /// order and the number of packets detected as lost.
    ///
    /// `pts_equals_dts` tells whether the packet timestamp is also its
    /// decode time; only then is it usable for jitter estimation.
    pub fn process_packet(
        &mut self,
        pkt: Packet,
        now: Instant,
        pts_equals_dts: bool,
    ) -> Result<(Vec<Packet>, u32)> {
        match self.remote_ssrc {
            None => self.remote_ssrc = Some(pkt.header.ssrc),
            Some(ssrc) if ssrc != pkt.header.ssrc => {
                return Err(Error::ErrSsrcMismatch(ssrc, pkt.header.ssrc));
            }
            _ => {}
        }

        let ts = pkt.header.timestamp;
        let (emitted, lost) = self.reorderer.process(pkt);

        for p in &emitted {
            let seq = p.header.sequence_number;
            if self.first_rtp_seen {
                let diff = seq.wrapping_sub(self.last_seq);
                if diff != 0 && diff < (1 << 15) && seq < self.last_seq {
                    self.seq_cycles = self.seq_cycles.wrapping_add(1);
                }
            }
            self.first_rtp_seen = true;
            self.last_seq = seq;
            self.total_since_report = self.total_since_report.saturating_add(1);
        }

        if lost > 0 {
            self.total_lost = self.total_lost.saturating_add(lost).min(TOTAL_LOST_MAX);
            self.total_lost_since_report = self
                .total_lost_since_report
                .saturating_add(lost)
                .min(TOTAL_LOST_MAX);
        }

        if pts_equals_dts {
            // https://tools.ietf.org/html/rfc3550#page-39
            if let Some(last_time) = self.last_rtp_time {
                let d = now.duration_since(last_time).as_secs_f64() * f64::from(self.clock_rate)
                    - f64::from(ts.wrapping_sub(self.last_rtp_ts) as i32);
                self.jitter += (d.abs() - self.jitter) / 16.0;
            }
            self.last_rtp_ts = ts;
            self.last_rtp_time = Some(now);
        }

        Ok((emitted, lost))
    }

    /// Stores the NTP/RTP pair of a sender report as the anchor for
    /// wall-clock mapping.
    pub fn process_sender_report(&mut self, sr: &SenderReport, now: Instant) {
        self.last_sr_ntp = Some(sr.ntp_time);
        self.last_sr_rtp = sr.rtp_time;
        self.last_sr_time = Some(now);
    }

    /// Maps an RTP timestamp to the sender's wall clock, using the last
    /// sender report as the anchor. None until a report was ingested.
    pub fn packet_ntp(&self, rtp_ts: u32) -> Option<SystemTime> {
        let ntp = self.last_sr_ntp?;
        let base = ntp2unix(ntp);

        let diff = rtp_ts.wrapping_sub(self.last_sr_rtp) as i32;
        let nanos = i64::from(diff) * 1_000_000_000 / i64::from(self.clock_rate);
        if nanos >= 0 {
            Some(base + Duration::from_nanos(nanos as u64))
        } else {
            Some(base - Duration::from_nanos(-nanos as u64))
        }
    }

    /// When the next report is due.
    pub fn poll_timeout(&self) -> Instant {
        self.eto
    }

    /// Emits a receiver report if the interval elapsed and at least one
    /// packet was seen. Per-interval counters restart afterwards.
    pub fn handle_timeout(&mut self, now: Instant) -> Option<ReceiverReport> {
        if now < self.eto {
            return None;
        }
        self.eto = now + self.interval;

        let remote_ssrc = self.remote_ssrc?;
        if !self.first_rtp_seen {
            return None;
        }

        let fraction_lost = if self.total_since_report > 0 {
            (u64::from(self.total_lost_since_report) * 256 / u64::from(self.total_since_report))
                .min(255) as u8
        } else {
            0
        };

        let (last_sender_report, delay) = match (self.last_sr_ntp, self.last_sr_time) {
            (Some(ntp), Some(t)) => (
                ntp_middle_32(ntp),
                (now.duration_since(t).as_secs_f64() * 65536.0) as u32,
            ),
            _ => (0, 0),
        };

        let report = ReceiverReport {
            ssrc: self.local_ssrc,
            reports: vec![ReceptionReport {
                ssrc: remote_ssrc,
                fraction_lost,
                total_lost: self.total_lost,
                last_sequence_number: (u32::from(self.seq_cycles) << 16)
                    | u32::from(self.last_seq),
                jitter: self.jitter as u32,
                last_sender_report,
                delay,
            }],
            ..Default::default()
        };

        self.total_lost_since_report = 0;
        self.total_since_report = 0;

        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtp::header::Header;

    const INTERVAL: Duration = Duration::from_secs(1);

    fn packet(seq: u16, ts: u32, ssrc: u32) -> Packet {
        Packet {
            header: Header {
                sequence_number: seq,
                timestamp: ts,
                ssrc,
                ..Default::default()
            },
            payload: bytes::Bytes::from_static(&[0xAA, 0xBB]),
            padding_size: 0,
        }
    }

    fn new_receiver(now: Instant) -> RtcpReceiver {
        RtcpReceiver::new(90000, Some(0x65F83AFB), INTERVAL, now).unwrap()
    }

    #[test]
    fn test_zero_clock_rate_rejected() {
        assert_eq!(
            RtcpReceiver::new(0, None, INTERVAL, Instant::now()).unwrap_err(),
            Error::ErrZeroClockRate
        );
    }

    #[test]
    fn test_basic_report() -> Result<()> {
        let t0 = Instant::now();
        let mut rr = new_receiver(t0);

        for i in 0..10u16 {
            rr.process_packet(packet(i, u32::from(i) * 3000, 0xBC5E9A40), t0, true)?;
        }

        let report = rr.handle_timeout(t0 + INTERVAL).unwrap();
        assert_eq!(report.ssrc, 0x65F83AFB);
        assert_eq!(report.reports.len(), 1);
        let rep = &report.reports[0];
        assert_eq!(rep.ssrc, 0xBC5E9A40);
        assert_eq!(rep.last_sequence_number, 9);
        assert_eq!(rep.fraction_lost, 0);
        assert_eq!(rep.total_lost, 0);
        assert_eq!(rep.last_sender_report, 0);
        assert_eq!(rep.delay, 0);

        Ok(())
    }

    #[test]
    fn test_no_report_before_interval() -> Result<()> {
        let t0 = Instant::now();
        let mut rr = new_receiver(t0);
        rr.process_packet(packet(0, 0, 1), t0, true)?;

        assert!(rr.handle_timeout(t0 + INTERVAL / 2).is_none());
        assert!(rr.handle_timeout(t0 + INTERVAL).is_some());

        Ok(())
    }

    #[test]
    fn test_no_report_without_packets() {
        let t0 = Instant::now();
        let mut rr = new_receiver(t0);
        assert!(rr.handle_timeout(t0 + INTERVAL).is_none());
    }

    #[test]
    fn test_ssrc_mismatch_rejected() -> Result<()> {
        let t0 = Instant::now();
        let mut rr = new_receiver(t0);
        rr.process_packet(packet(0, 0, 100), t0, true)?;

        assert_eq!(
            rr.process_packet(packet(1, 0, 101), t0, true).unwrap_err(),
            Error::ErrSsrcMismatch(100, 101)
        );

        Ok(())
    }

    #[test]
    fn test_loss_accounting() -> Result<()> {
        let t0 = Instant::now();
        let mut rr = new_receiver(t0);

        rr.process_packet(packet(0, 0, 1), t0, true)?;
        // jump beyond the reorder window: 99 packets never showed up
        let (emitted, lost) = rr.process_packet(packet(100, 3000, 1), t0, true)?;
        assert_eq!(emitted.len(), 1);
        assert_eq!(lost, 99);

        let report = rr.handle_timeout(t0 + INTERVAL).unwrap();
        let rep = &report.reports[0];
        assert_eq!(rep.total_lost, 99);
        assert_eq!(rep.last_sequence_number, 100);
        // 99 lost over 2 received saturates the 8-bit fraction
        assert_eq!(rep.fraction_lost, 255);

        // counters reset after the report
        rr.process_packet(packet(101, 6000, 1), t0, true)?;
        let report = rr.handle_timeout(t0 + 2 * INTERVAL).unwrap();
        assert_eq!(report.reports[0].fraction_lost, 0);
        assert_eq!(report.reports[0].total_lost, 99);

        Ok(())
    }

    #[test]
    fn test_sequence_cycles() -> Result<()> {
        let t0 = Instant::now();
        let mut rr = new_receiver(t0);

        rr.process_packet(packet(0xFFFF, 0, 1), t0, true)?;
        rr.process_packet(packet(0x0000, 3000, 1), t0, true)?;

        let report = rr.handle_timeout(t0 + INTERVAL).unwrap();
        assert_eq!(report.reports[0].last_sequence_number, 1 << 16);

        Ok(())
    }

    #[test]
    fn test_jitter() -> Result<()> {
        let t0 = Instant::now();
        let mut rr = new_receiver(t0);

        rr.process_packet(packet(0, 0, 1), t0, true)?;
        // the packet claims to be 3000 ticks (33 ms) later but arrives
        // after 100 ms: D = 0.1 * 90000 - 3000 = 6000, jitter = D / 16
        rr.process_packet(packet(1, 3000, 1), t0 + Duration::from_millis(100), true)?;

        let report = rr.handle_timeout(t0 + INTERVAL).unwrap();
        assert_eq!(report.reports[0].jitter, 375);

        Ok(())
    }

    #[test]
    fn test_jitter_skips_non_monotonic_timestamps() -> Result<()> {
        let t0 = Instant::now();
        let mut rr = new_receiver(t0);

        rr.process_packet(packet(0, 0, 1), t0, true)?;
        // a B-frame: timestamp is not the decode time, jitter untouched
        rr.process_packet(packet(1, 9000, 1), t0 + Duration::from_millis(33), false)?;

        let report = rr.handle_timeout(t0 + INTERVAL).unwrap();
        assert_eq!(report.reports[0].jitter, 0);

        Ok(())
    }

    #[test]
    fn test_sender_report_anchor() -> Result<()> {
        let t0 = Instant::now();
        let mut rr = new_receiver(t0);
        rr.process_packet(packet(0, 0, 1), t0, true)?;

        let sr = SenderReport {
            ssrc: 1,
            ntp_time: 0x1234_5678_0000_0000,
            rtp_time: 3000,
            ..Default::default()
        };
        rr.process_sender_report(&sr, t0);

        let report = rr.handle_timeout(t0 + INTERVAL).unwrap();
        let rep = &report.reports[0];
        assert_eq!(rep.last_sender_report, 0x5678_0000);
        assert_eq!(rep.delay, 65536);

        Ok(())
    }

    #[test]
    fn test_packet_ntp() -> Result<()> {
        let t0 = Instant::now();
        let mut rr = new_receiver(t0);

        assert!(rr.packet_ntp(0).is_none());

        let wall = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let sr = SenderReport {
            ssrc: 1,
            ntp_time: shared::time::unix2ntp(wall),
            rtp_time: 90000,
            ..Default::default()
        };
        rr.process_sender_report(&sr, t0);

        // two seconds of RTP ticks past the anchor
        let mapped = rr.packet_ntp(270_000).unwrap();
        let diff = mapped.duration_since(wall).unwrap();
        assert!((diff.as_secs_f64() - 2.0).abs() < 1e-6);

        // and one second before it
        let mapped = rr.packet_ntp(0).unwrap();
        let diff = wall.duration_since(mapped).unwrap();
        assert!((diff.as_secs_f64() - 1.0).abs() < 1e-6);

        Ok(())
    }
}
