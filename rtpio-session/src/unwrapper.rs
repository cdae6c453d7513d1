/// Threshold below which a negative timestamp delta is read as a forward
/// wrap of the 32-bit counter rather than a step backwards.
const WRAP_THRESHOLD: i64 = 0xFF_FFFF;

/// Extends 32-bit RTP timestamps into a signed tick count relative to the
/// first observed timestamp, across forward and backward wraparound.
///
/// The output grows monotonically as long as the genuine deltas do;
/// backward excursions smaller than the wrap threshold come out as
/// negative ticks.
#[derive(Debug, Default)]
pub struct TimestampUnwrapper {
    clock_rate: u32,
    initialized: bool,
    ts_initial: u32,
    ts_prev: u32,
    ts_add: i64,
}

impl TimestampUnwrapper {
    pub fn new(clock_rate: u32) -> Self {
        TimestampUnwrapper {
            clock_rate,
            ..Default::default()
        }
    }

    /// Feeds a raw timestamp and returns the extended tick count relative
    /// to the first one.
    pub fn unwrap(&mut self, ts: u32) -> i64 {
        if !self.initialized {
            self.initialized = true;
            self.ts_initial = ts;
            self.ts_prev = ts;
            self.ts_add = 0;
            return 0;
        }

        let diff = i64::from(ts) - i64::from(self.ts_prev);
        if diff < -WRAP_THRESHOLD {
            self.ts_add += 1 << 32;
        } else if diff > WRAP_THRESHOLD {
            self.ts_add -= 1 << 32;
        }
        self.ts_prev = ts;

        i64::from(ts) + self.ts_add - i64::from(self.ts_initial)
    }

    /// Same as [`unwrap`](Self::unwrap), scaled to seconds by the clock
    /// rate.
    pub fn unwrap_secs(&mut self, ts: u32) -> f64 {
        self.unwrap(ts) as f64 / f64::from(self.clock_rate)
    }

    pub fn clock_rate(&self) -> u32 {
        self.clock_rate
    }
}
