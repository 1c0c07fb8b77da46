//! Time-sampled values.
//!
//! A [`TimeSamples`] table maps non-decreasing times to values; a sample
//! may be *blocked*, meaning "explicitly no value at this time". Duplicate
//! times are legal and the latest write wins when flattened.

use super::Value;

/// Sentinel time codes.
pub struct TimeCode;

impl TimeCode {
    /// The "default" time code: resolves to the first authored sample.
    pub const DEFAULT: f64 = f64::NAN;

    #[inline]
    pub fn is_default(t: f64) -> bool {
        t.is_nan()
    }
}

/// Interpolation used when sampling between authored times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimeSampleInterpolation {
    /// Value at the greatest authored time `t' <= t`.
    #[default]
    Held,
    /// Linear blend between the bracketing samples (numeric types).
    Linear,
}

/// One authored sample; `value == None` encodes an attribute block.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub t: f64,
    pub value: Option<Value>,
}

/// A sorted `(time -> value | blocked)` table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeSamples {
    samples: Vec<Sample>,
}

impl TimeSamples {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample, keeping times non-decreasing. Out-of-order inserts
    /// are placed after any existing samples at the same time so the
    /// latest write wins on flattening.
    pub fn add_sample(&mut self, t: f64, value: Value) {
        self.insert(Sample {
            t,
            value: Some(value),
        });
    }

    /// Append a blocked sample at the given time.
    pub fn add_blocked(&mut self, t: f64) {
        self.insert(Sample { t, value: None });
    }

    fn insert(&mut self, s: Sample) {
        let pos = self
            .samples
            .partition_point(|existing| existing.t <= s.t);
        self.samples.insert(pos, s);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Authored times, in order.
    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.t).collect()
    }

    /// Index of the greatest sample with `t' <= t`; `None` when `t`
    /// precedes the first sample.
    pub fn floor_index(&self, t: f64) -> Option<usize> {
        if self.samples.is_empty() {
            return None;
        }
        // Last sample at a duplicate time wins.
        let n = self.samples.partition_point(|s| s.t <= t);
        if n == 0 {
            None
        } else {
            Some(n - 1)
        }
    }

    /// The sample used at time `t` with held interpolation.
    /// `TimeCode::DEFAULT` selects the first sample.
    pub fn sample_at(&self, t: f64) -> Option<&Sample> {
        if self.samples.is_empty() {
            return None;
        }
        if TimeCode::is_default(t) {
            return self.samples.first();
        }
        match self.floor_index(t) {
            Some(i) => Some(&self.samples[i]),
            // Before the first sample: hold the first.
            None => self.samples.first(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_insert() {
        let mut ts = TimeSamples::new();
        ts.add_sample(1.0, Value::Double(2.3));
        ts.add_sample(0.0, Value::Double(1.2));
        assert_eq!(ts.times(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_duplicate_time_latest_wins() {
        let mut ts = TimeSamples::new();
        ts.add_sample(1.0, Value::Int(1));
        ts.add_sample(1.0, Value::Int(2));
        let s = ts.sample_at(1.0).unwrap();
        assert_eq!(s.value, Some(Value::Int(2)));
    }

    #[test]
    fn test_blocked_sample() {
        let mut ts = TimeSamples::new();
        ts.add_sample(0.0, Value::Float(1.0));
        ts.add_blocked(1.0);
        assert!(ts.sample_at(1.5).unwrap().value.is_none());
        assert!(ts.sample_at(0.5).unwrap().value.is_some());
    }

    #[test]
    fn test_default_time_code() {
        let mut ts = TimeSamples::new();
        ts.add_sample(3.0, Value::Int(7));
        ts.add_sample(5.0, Value::Int(9));
        let s = ts.sample_at(TimeCode::DEFAULT).unwrap();
        assert_eq!(s.value, Some(Value::Int(7)));
    }

    #[test]
    fn test_floor_lookup() {
        let mut ts = TimeSamples::new();
        ts.add_sample(0.0, Value::Int(0));
        ts.add_sample(10.0, Value::Int(10));
        assert_eq!(ts.floor_index(-1.0), None);
        assert_eq!(ts.floor_index(0.0), Some(0));
        assert_eq!(ts.floor_index(9.9), Some(0));
        assert_eq!(ts.floor_index(10.0), Some(1));
        assert_eq!(ts.floor_index(99.0), Some(1));
    }
}
