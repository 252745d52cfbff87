//! Unit-tagged time scalars.
//!
//! [`Time`] is an absolute position, [`Duration`] a discrete offset and
//! [`ContinuousDuration`] a fractional one. Each carries a zero-sized unit
//! marker, so adding beats to samples does not compile:
//!
//! ```compile_fail
//! use nowloop_core::time::{AudioSample, Beat, Duration, Time};
//! let t = Time::<AudioSample>::new(10);
//! let _ = t + Duration::<Beat>::new(1);
//! ```
//!
//! Converting between units goes through [`Clock`](crate::Clock).

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use serde::{Deserialize, Serialize};

/// Marker trait for the unit spaces a time value can live in.
pub trait Unit: 'static + Send + Sync {
    const NAME: &'static str;
}

/// One audio sample (per channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AudioSample;

/// One musical beat at the clock's tempo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Beat;

/// One second of wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Second;

impl Unit for AudioSample {
    const NAME: &'static str = "samples";
}

impl Unit for Beat {
    const NAME: &'static str = "beats";
}

impl Unit for Second {
    const NAME: &'static str = "seconds";
}

/// Absolute position on a timeline.
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct Time<U: Unit> {
    value: i64,
    #[serde(skip)]
    _unit: PhantomData<fn() -> U>,
}

/// Discrete signed offset between two [`Time`]s.
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct Duration<U: Unit> {
    value: i64,
    #[serde(skip)]
    _unit: PhantomData<fn() -> U>,
}

/// Fractional duration, for sub-sample beat lengths and beat positions.
#[derive(Serialize, Deserialize)]
#[serde(transparent, bound = "")]
pub struct ContinuousDuration<U: Unit> {
    value: f64,
    #[serde(skip)]
    _unit: PhantomData<fn() -> U>,
}

macro_rules! discrete_scalar {
    ($name:ident) => {
        impl<U: Unit> $name<U> {
            #[inline]
            pub const fn new(value: i64) -> Self {
                Self {
                    value,
                    _unit: PhantomData,
                }
            }

            #[inline]
            pub const fn value(self) -> i64 {
                self.value
            }
        }

        impl<U: Unit> Clone for $name<U> {
            #[inline]
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<U: Unit> Copy for $name<U> {}

        impl<U: Unit> PartialEq for $name<U> {
            #[inline]
            fn eq(&self, other: &Self) -> bool {
                self.value == other.value
            }
        }

        impl<U: Unit> Eq for $name<U> {}

        impl<U: Unit> PartialOrd for $name<U> {
            #[inline]
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl<U: Unit> Ord for $name<U> {
            #[inline]
            fn cmp(&self, other: &Self) -> Ordering {
                self.value.cmp(&other.value)
            }
        }

        impl<U: Unit> Hash for $name<U> {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.value.hash(state);
            }
        }

        impl<U: Unit> Default for $name<U> {
            fn default() -> Self {
                Self::new(0)
            }
        }

        impl<U: Unit> fmt::Debug for $name<U> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({} {})", stringify!($name), self.value, U::NAME)
            }
        }

        impl<U: Unit> fmt::Display for $name<U> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", self.value, U::NAME)
            }
        }
    };
}

discrete_scalar!(Time);
discrete_scalar!(Duration);

impl<U: Unit> Add<Duration<U>> for Time<U> {
    type Output = Time<U>;

    #[inline]
    fn add(self, rhs: Duration<U>) -> Time<U> {
        Time::new(self.value + rhs.value)
    }
}

impl<U: Unit> AddAssign<Duration<U>> for Time<U> {
    #[inline]
    fn add_assign(&mut self, rhs: Duration<U>) {
        self.value += rhs.value;
    }
}

impl<U: Unit> Sub<Duration<U>> for Time<U> {
    type Output = Time<U>;

    #[inline]
    fn sub(self, rhs: Duration<U>) -> Time<U> {
        Time::new(self.value - rhs.value)
    }
}

impl<U: Unit> Sub<Time<U>> for Time<U> {
    type Output = Duration<U>;

    #[inline]
    fn sub(self, rhs: Time<U>) -> Duration<U> {
        Duration::new(self.value - rhs.value)
    }
}

impl<U: Unit> Duration<U> {
    /// Duration covering `len` elements of a buffer.
    #[inline]
    pub fn from_len(len: usize) -> Self {
        Self::new(len as i64)
    }

    /// The duration as a buffer length. Negative durations are a contract violation.
    #[inline]
    pub fn as_len(self) -> usize {
        assert!(self.value >= 0, "negative duration used as a length: {self:?}");
        self.value as usize
    }

    #[inline]
    pub fn to_continuous(self) -> ContinuousDuration<U> {
        ContinuousDuration::new(self.value as f64)
    }

    /// Euclidean remainder, always in `[0, rhs)` for positive `rhs`.
    #[inline]
    pub fn rem_euclid(self, rhs: Duration<U>) -> Duration<U> {
        Duration::new(self.value.rem_euclid(rhs.value))
    }
}

impl<U: Unit> Add for Duration<U> {
    type Output = Duration<U>;

    #[inline]
    fn add(self, rhs: Duration<U>) -> Duration<U> {
        Duration::new(self.value + rhs.value)
    }
}

impl<U: Unit> AddAssign for Duration<U> {
    #[inline]
    fn add_assign(&mut self, rhs: Duration<U>) {
        self.value += rhs.value;
    }
}

impl<U: Unit> Sub for Duration<U> {
    type Output = Duration<U>;

    #[inline]
    fn sub(self, rhs: Duration<U>) -> Duration<U> {
        Duration::new(self.value - rhs.value)
    }
}

impl<U: Unit> SubAssign for Duration<U> {
    #[inline]
    fn sub_assign(&mut self, rhs: Duration<U>) {
        self.value -= rhs.value;
    }
}

impl<U: Unit> ContinuousDuration<U> {
    #[inline]
    pub const fn new(value: f64) -> Self {
        Self {
            value,
            _unit: PhantomData,
        }
    }

    #[inline]
    pub const fn value(self) -> f64 {
        self.value
    }

    /// Smallest discrete duration that is at least this long.
    #[inline]
    pub fn ceil(self) -> Duration<U> {
        Duration::new(self.value.ceil() as i64)
    }

    /// Whole units contained in this duration.
    #[inline]
    pub fn floor(self) -> Duration<U> {
        Duration::new(self.value.floor() as i64)
    }

    /// Fractional part, in `[0, 1)` for non-negative values.
    #[inline]
    pub fn fract(self) -> f64 {
        self.value - self.value.floor()
    }
}

impl<U: Unit> Clone for ContinuousDuration<U> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<U: Unit> Copy for ContinuousDuration<U> {}

impl<U: Unit> PartialEq for ContinuousDuration<U> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<U: Unit> PartialOrd for ContinuousDuration<U> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl<U: Unit> Default for ContinuousDuration<U> {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl<U: Unit> fmt::Debug for ContinuousDuration<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContinuousDuration({} {})", self.value, U::NAME)
    }
}

impl<U: Unit> From<Duration<U>> for ContinuousDuration<U> {
    #[inline]
    fn from(duration: Duration<U>) -> Self {
        duration.to_continuous()
    }
}

impl<U: Unit> Add for ContinuousDuration<U> {
    type Output = ContinuousDuration<U>;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.value + rhs.value)
    }
}

impl<U: Unit> Sub for ContinuousDuration<U> {
    type Output = ContinuousDuration<U>;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.value - rhs.value)
    }
}

impl<U: Unit> Mul<f64> for ContinuousDuration<U> {
    type Output = ContinuousDuration<U>;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.value * rhs)
    }
}

/// Half-open span `[start, start + duration)`.
pub struct Interval<U: Unit> {
    start: Time<U>,
    duration: Duration<U>,
}

impl<U: Unit> Interval<U> {
    #[inline]
    pub fn new(start: Time<U>, duration: Duration<U>) -> Self {
        assert!(
            duration.value() >= 0,
            "interval duration must be non-negative, got {duration:?}"
        );
        Self { start, duration }
    }

    #[inline]
    pub fn start(&self) -> Time<U> {
        self.start
    }

    #[inline]
    pub fn duration(&self) -> Duration<U> {
        self.duration
    }

    #[inline]
    pub fn end(&self) -> Time<U> {
        self.start + self.duration
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.duration.value() == 0
    }

    #[inline]
    pub fn contains(&self, time: Time<U>) -> bool {
        time >= self.start && time < self.end()
    }

    /// The part of this interval left after consuming `consumed` from its front.
    #[inline]
    pub fn suffix(&self, consumed: Duration<U>) -> Self {
        assert!(consumed <= self.duration, "suffix past end of interval");
        Self::new(self.start + consumed, self.duration - consumed)
    }
}

impl<U: Unit> Clone for Interval<U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<U: Unit> Copy for Interval<U> {}

impl<U: Unit> PartialEq for Interval<U> {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.duration == other.duration
    }
}

impl<U: Unit> Eq for Interval<U> {}

impl<U: Unit> fmt::Debug for Interval<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Interval[{}, {}) {}",
            self.start.value(),
            self.end().value(),
            U::NAME
        )
    }
}
