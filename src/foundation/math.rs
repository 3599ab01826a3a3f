use std::cmp::Ordering;

/// Rational duration of one timestamp tick, in seconds (`num / den`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeBase {
    /// Numerator.
    pub num: u32,
    /// Denominator, must be > 0.
    pub den: u32,
}

impl TimeBase {
    /// Build a time base of `num / den` seconds per tick.
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// Time base for a stream ticking once per frame (`1 / fps`) or per sample (`1 / rate`).
    pub const fn per_second(rate: u32) -> Self {
        Self { num: 1, den: rate }
    }

    /// Convert a timestamp in this base to seconds.
    pub fn seconds(self, ts: i64) -> f64 {
        (ts as f64) * f64::from(self.num) / f64::from(self.den)
    }

    /// Rescale `ts` from this base into `to`, rounding to the nearest tick.
    pub fn rescale(self, ts: i64, to: TimeBase) -> i64 {
        let n = i128::from(ts) * i128::from(self.num) * i128::from(to.den);
        let d = i128::from(self.den) * i128::from(to.num);
        if d == 0 {
            return 0;
        }
        let half = d / 2;
        let q = if n >= 0 { (n + half) / d } else { (n - half) / d };
        q.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }
}

/// Exact comparison of two timestamps expressed in different time bases.
pub fn compare_ts(a: i64, a_tb: TimeBase, b: i64, b_tb: TimeBase) -> Ordering {
    let lhs = i128::from(a) * i128::from(a_tb.num) * i128::from(b_tb.den);
    let rhs = i128::from(b) * i128::from(b_tb.num) * i128::from(a_tb.den);
    lhs.cmp(&rhs)
}
