//! Typed time-varying values.
//!
//! [`Animatable`] is the typed counterpart of the generic
//! [`TimeSamples`](super::TimeSamples) table: a slot is either a single
//! value, a sequence of typed samples (some possibly blocked), or blocked
//! outright. Connections are carried by the enclosing attribute slot,
//! never by the `Animatable` itself.

use super::time_samples::{TimeCode, TimeSampleInterpolation};

/// Linear interpolation between two samples.
pub trait Lerp: Clone {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

macro_rules! impl_lerp_float {
    ($($ty:ty),*) => {
        $(impl Lerp for $ty {
            #[inline]
            fn lerp(a: &Self, b: &Self, t: f64) -> Self {
                let t = t as $ty;
                *a + (*b - *a) * t
            }
        })*
    };
}

impl_lerp_float!(f32, f64);

macro_rules! impl_lerp_glam {
    ($($ty:ty),*) => {
        $(impl Lerp for $ty {
            #[inline]
            fn lerp(a: &Self, b: &Self, t: f64) -> Self {
                a.lerp(*b, t as f32)
            }
        })*
    };
}

impl_lerp_glam!(glam::Vec2, glam::Vec3, glam::Vec4);

macro_rules! impl_lerp_glam_d {
    ($($ty:ty),*) => {
        $(impl Lerp for $ty {
            #[inline]
            fn lerp(a: &Self, b: &Self, t: f64) -> Self {
                a.lerp(*b, t)
            }
        })*
    };
}

impl_lerp_glam_d!(glam::DVec2, glam::DVec3, glam::DVec4);

/// One typed sample; `None` is a blocked sample.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedSample<T> {
    pub t: f64,
    pub value: Option<T>,
}

/// Sorted typed sample table.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedTimeSamples<T> {
    samples: Vec<TypedSample<T>>,
}

impl<T> Default for TypedTimeSamples<T> {
    fn default() -> Self {
        Self {
            samples: Vec::new(),
        }
    }
}

impl<T: Clone> TypedTimeSamples<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sample(&mut self, t: f64, value: T) {
        self.insert(TypedSample {
            t,
            value: Some(value),
        });
    }

    pub fn add_blocked_sample(&mut self, t: f64) {
        self.insert(TypedSample { t, value: None });
    }

    fn insert(&mut self, s: TypedSample<T>) {
        let pos = self.samples.partition_point(|e| e.t <= s.t);
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
    pub fn samples(&self) -> &[TypedSample<T>] {
        &self.samples
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.t).collect()
    }

    /// Held sampling: value at the greatest `t' <= t`. Before the first
    /// sample the first value is held; `TimeCode::DEFAULT` selects the
    /// first sample. Blocked samples yield `None`.
    pub fn sample_held(&self, t: f64) -> Option<T> {
        if self.samples.is_empty() {
            return None;
        }
        if TimeCode::is_default(t) {
            return self.samples[0].value.clone();
        }
        let n = self.samples.partition_point(|s| s.t <= t);
        let idx = if n == 0 { 0 } else { n - 1 };
        self.samples[idx].value.clone()
    }
}

impl<T: Lerp> TypedTimeSamples<T> {
    /// Linear sampling between the bracketing samples. Blocked samples on
    /// either side of the bracket fall back to held behavior.
    pub fn sample_linear(&self, t: f64) -> Option<T> {
        if self.samples.is_empty() {
            return None;
        }
        if TimeCode::is_default(t) {
            return self.samples[0].value.clone();
        }
        let n = self.samples.partition_point(|s| s.t <= t);
        if n == 0 {
            return self.samples[0].value.clone();
        }
        let lo = &self.samples[n - 1];
        if n >= self.samples.len() {
            return lo.value.clone();
        }
        let hi = &self.samples[n];
        match (&lo.value, &hi.value) {
            (Some(a), Some(b)) if hi.t > lo.t => {
                let alpha = (t - lo.t) / (hi.t - lo.t);
                Some(Lerp::lerp(a, b, alpha))
            }
            _ => lo.value.clone(),
        }
    }
}

/// A value that is a single `T`, a typed sample table, or blocked.
#[derive(Clone, Debug, PartialEq)]
pub enum Animatable<T> {
    Value(T),
    TimeSamples(TypedTimeSamples<T>),
    Blocked,
}

impl<T: Clone> Animatable<T> {
    #[inline]
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked)
    }

    #[inline]
    pub fn is_timesamples(&self) -> bool {
        matches!(self, Self::TimeSamples(_))
    }

    #[inline]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn get_scalar(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_timesamples(&self) -> Option<&TypedTimeSamples<T>> {
        match self {
            Self::TimeSamples(ts) => Some(ts),
            _ => None,
        }
    }

    /// Sample at time `t` with held interpolation.
    pub fn sample_held(&self, t: f64) -> Option<T> {
        match self {
            Self::Value(v) => Some(v.clone()),
            Self::TimeSamples(ts) => ts.sample_held(t),
            Self::Blocked => None,
        }
    }
}

impl<T: Lerp> Animatable<T> {
    /// Sample at time `t` with the requested interpolation.
    pub fn sample_at(&self, t: f64, interp: TimeSampleInterpolation) -> Option<T> {
        match self {
            Self::Value(v) => Some(v.clone()),
            Self::TimeSamples(ts) => match interp {
                TimeSampleInterpolation::Held => ts.sample_held(t),
                TimeSampleInterpolation::Linear => ts.sample_linear(t),
            },
            Self::Blocked => None,
        }
    }
}

impl<T> From<T> for Animatable<T> {
    fn from(v: T) -> Self {
        Self::Value(v)
    }
}
