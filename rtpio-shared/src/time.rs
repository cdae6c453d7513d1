use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Offset in seconds between the unix epoch and the NTP epoch (1900-01-01).
pub const UNIX_TO_NTP_OFFSET: u64 = 0x83AA_7E80;

/// Encodes a wall-clock time as an NTP timestamp: seconds since 1900-01-01
/// UTC in 32.32 fixed point.
pub fn unix2ntp(st: SystemTime) -> u64 {
    let u = st
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_nanos() as u64;

    let mut s = u / 1_000_000_000;
    s += UNIX_TO_NTP_OFFSET;
    let mut f = u % 1_000_000_000;
    f <<= 32;
    f /= 1_000_000_000;
    s <<= 32;

    s | f
}

/// Decodes a 32.32 NTP timestamp back into a wall-clock time. Values before
/// the unix epoch clamp to it.
pub fn ntp2unix(t: u64) -> SystemTime {
    let s = (t >> 32).saturating_sub(UNIX_TO_NTP_OFFSET);
    let mut f = t & 0xFFFF_FFFF;
    f *= 1_000_000_000;
    f >>= 32;

    UNIX_EPOCH + Duration::new(s, f as u32)
}

/// Middle 32 bits of an NTP timestamp, the form carried in the LSR field of
/// reception reports.
pub fn ntp_middle_32(t: u64) -> u32 {
    ((t >> 16) & 0xFFFF_FFFF) as u32
}

/// Pairs a monotonic instant with the wall clock observed at the same
/// moment, so later instants can be mapped to wall-clock and NTP time
/// without re-reading the system clock.
#[derive(Debug, Copy, Clone)]
pub struct SystemClock {
    instant: Instant,
    system_time: SystemTime,
}

impl SystemClock {
    pub fn now() -> Self {
        SystemClock {
            instant: Instant::now(),
            system_time: SystemTime::now(),
        }
    }

    /// Anchors the clock to an explicit pair of readings; tests use this
    /// to keep the mapping deterministic.
    pub fn from_pair(instant: Instant, system_time: SystemTime) -> Self {
        SystemClock {
            instant,
            system_time,
        }
    }

    /// Wall-clock time corresponding to a monotonic instant. Instants
    /// before the anchor clamp to it.
    pub fn system_time(&self, now: Instant) -> SystemTime {
        self.system_time + now.saturating_duration_since(self.instant)
    }

    /// NTP 32.32 timestamp corresponding to a monotonic instant.
    pub fn ntp(&self, now: Instant) -> u64 {
        unix2ntp(self.system_time(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ntp_round_trip() {
        let st = UNIX_EPOCH + Duration::new(1_700_000_000, 500_000_000);
        let ntp = unix2ntp(st);
        let back = ntp2unix(ntp);
        let diff = if back > st {
            back.duration_since(st).unwrap()
        } else {
            st.duration_since(back).unwrap()
        };
        // 32-bit fraction keeps sub-nanosecond precision
        assert!(diff < Duration::from_nanos(2), "diff {diff:?}");
    }

    #[test]
    fn test_ntp_epoch_offset() {
        let ntp = unix2ntp(UNIX_EPOCH);
        assert_eq!(ntp >> 32, UNIX_TO_NTP_OFFSET);
        assert_eq!(ntp & 0xFFFF_FFFF, 0);
    }

    #[test]
    fn test_ntp_middle_32() {
        assert_eq!(ntp_middle_32(0x1234_5678_9ABC_DEF0), 0x5678_9ABC);
    }

    #[test]
    fn test_ntp_before_unix_epoch_clamps() {
        assert_eq!(ntp2unix(0), UNIX_EPOCH);
    }

    #[test]
    fn test_system_clock_maps_instants() {
        let anchor = Instant::now();
        let wall = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let clock = SystemClock::from_pair(anchor, wall);

        assert_eq!(clock.system_time(anchor), wall);
        assert_eq!(
            clock.system_time(anchor + Duration::from_secs(3)),
            wall + Duration::from_secs(3)
        );
        assert_eq!(
            clock.ntp(anchor + Duration::from_secs(3)),
            unix2ntp(wall + Duration::from_secs(3))
        );
    }
}
