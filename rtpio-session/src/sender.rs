use std::time::{Duration, SystemTime};

use rtcp::sender_report::SenderReport;
use rtp::packet::Packet;
use shared::time::unix2ntp;

/// Send-side bookkeeping for one RTP stream: counts transmitted packets
/// and octets and synthesizes sender reports on timeout ticks.
///
/// Every operation takes the current wall-clock time, so tests drive the
/// clock directly. `ntp` is the capture time of the media in a packet,
/// which can lag the moment the packet is processed.
#[derive(Debug)]
pub struct RtcpSender {
    clock_rate: u32,
    local_ssrc: u32,
    interval: Duration,
    eto: SystemTime,

    first_sent: bool,
    last_rtp_ts: u32,
    last_ntp: SystemTime,
    last_system_time: SystemTime,
    last_seq: u16,
    packet_count: u32,
    octet_count: u32,
}

impl RtcpSender {
    pub fn new(
        clock_rate: u32,
        local_ssrc: Option<u32>,
        interval: Duration,
        now: SystemTime,
    ) -> Self {
        RtcpSender {
            clock_rate,
            local_ssrc: local_ssrc.unwrap_or_else(rand::random::<u32>),
            interval,
            eto: now + interval,
            first_sent: false,
            last_rtp_ts: 0,
            last_ntp: SystemTime::UNIX_EPOCH,
            last_system_time: SystemTime::UNIX_EPOCH,
            last_seq: 0,
            packet_count: 0,
            octet_count: 0,
        }
    }

    pub fn local_ssrc(&self) -> u32 {
        self.local_ssrc
    }

    /// Sequence number of the last processed packet.
    pub fn last_sequence_number(&self) -> u16 {
        self.last_seq
    }

    /// Accounts one transmitted packet. The RTP/NTP anchor is refreshed
    /// only when `pts_equals_dts` holds, counters always move.
    pub fn process_packet(
        &mut self,
        pkt: &Packet,
        now: SystemTime,
        ntp: SystemTime,
        pts_equals_dts: bool,
    ) {
        if pts_equals_dts {
            self.first_sent = true;
            self.last_rtp_ts = pkt.header.timestamp;
            self.last_ntp = ntp;
            self.last_system_time = now;
        }
        self.last_seq = pkt.header.sequence_number;
        self.packet_count = self.packet_count.wrapping_add(1);
        self.octet_count = self.octet_count.wrapping_add(pkt.payload.len() as u32);
    }

    /// When the next report is due.
    pub fn poll_timeout(&self) -> SystemTime {
        self.eto
    }

    /// Emits a sender report if the interval elapsed. Suppressed until the
    /// first anchored packet, and entirely when the clock rate is zero.
    pub fn handle_timeout(&mut self, now: SystemTime) -> Option<SenderReport> {
        if now < self.eto {
            return None;
        }
        self.eto = now + self.interval;

        if !self.first_sent || self.clock_rate == 0 {
            return None;
        }

        let since_anchor = now
            .duration_since(self.last_system_time)
            .unwrap_or_default();
        let since_capture = now.duration_since(self.last_ntp).unwrap_or_default();

        Some(SenderReport {
            ssrc: self.local_ssrc,
            ntp_time: unix2ntp(self.last_ntp + since_anchor),
            rtp_time: self
                .last_rtp_ts
                .wrapping_add((since_capture.as_secs_f64() * f64::from(self.clock_rate)) as u32),
            packet_count: self.packet_count,
            octet_count: self.octet_count,
            ..Default::default()
        })
    }
}
