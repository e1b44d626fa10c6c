//! Describes the signals the generators synthesize.
//!
//! A [TimeVaryingSignalDescriptor] defines a Gaussian peak whose power follows a schedule of
//! [SignalSegment]s. The schedule is piecewise constant and optionally repeats.
use std::time::Duration;
use thiserror::Error;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// A single sample of a frame.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct SignalDataPoint {
    /// Frequency in MHz.
    pub frequency: f64,
    /// Signal power in dBm, or a normalized value once the frame has passed the normalizer.
    pub power: f64,
}

impl SignalDataPoint {
    pub fn new(frequency: f64, power: f64) -> Self {
        Self { frequency, power }
    }
}

/// A length of time which may be unbounded.
///
/// The variant order matters: every finite duration compares less than [SignalDuration::Infinite].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SignalDuration {
    Finite(Duration),
    Infinite,
}

impl SignalDuration {
    pub const ZERO: Self = Self::Finite(Duration::ZERO);

    pub fn is_finite(&self) -> bool {
        matches!(self, Self::Finite(_))
    }

    /// Returns the duration if it is finite.
    pub fn finite(&self) -> Option<Duration> {
        match self {
            Self::Finite(duration) => Some(*duration),
            Self::Infinite => None,
        }
    }

    /// Adds two durations, an overflow is treated as infinite.
    pub fn saturating_add(self, other: Self) -> Self {
        match (self, other) {
            (Self::Finite(lhs), Self::Finite(rhs)) => {
                lhs.checked_add(rhs).map(Self::Finite).unwrap_or(Self::Infinite)
            }
            _ => Self::Infinite,
        }
    }

    /// Returns true if `elapsed` has reached the end of this duration.
    pub fn has_elapsed(&self, elapsed: Duration) -> bool {
        match self {
            Self::Finite(duration) => elapsed >= *duration,
            Self::Infinite => false,
        }
    }
}

impl From<Duration> for SignalDuration {
    fn from(duration: Duration) -> Self {
        Self::Finite(duration)
    }
}

/// One piece of a piecewise-constant power schedule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SignalSegment {
    /// How long the segment lasts, only the last segment of a schedule may be infinite.
    pub duration: SignalDuration,
    /// Power at the top of the Gaussian peak while this segment is active.
    pub power: f64,
}

impl SignalSegment {
    pub fn new(duration: Duration, power: f64) -> Self {
        Self {
            duration: SignalDuration::Finite(duration),
            power,
        }
    }

    pub fn infinite(power: f64) -> Self {
        Self {
            duration: SignalDuration::Infinite,
            power,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum DescriptorError {
    #[error("Centre frequency must be finite, got {0}")]
    CenterFrequency(f64),
    #[error("Width must be finite and positive, got {0}")]
    Width(f64),
    #[error("A signal requires at least one segment")]
    NoSegments,
    #[error("Segment {index} has non-finite power {power}")]
    SegmentPower { index: usize, power: f64 },
    #[error("Segment {index} follows an infinite segment and can never be reached")]
    UnreachableSegment { index: usize },
}

/// A Gaussian signal peak whose power changes piecewise over time.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeVaryingSignalDescriptor {
    center_frequency: f64,
    width: f64,
    segments: Vec<SignalSegment>,
    looping: bool,
}

impl TimeVaryingSignalDescriptor {
    /// Creates a validated descriptor.
    /// # Parameters
    /// - center_frequency: centre of the peak in MHz.
    /// - width: standard deviation of the peak in MHz.
    /// - segments: the power schedule, in order.
    /// - looping: if set, the schedule repeats once its last segment ends.
    pub fn new(
        center_frequency: f64,
        width: f64,
        segments: Vec<SignalSegment>,
        looping: bool,
    ) -> Result<Self, DescriptorError> {
        if !center_frequency.is_finite() {
            return Err(DescriptorError::CenterFrequency(center_frequency));
        }
        if !width.is_finite() || width <= 0.0 {
            return Err(DescriptorError::Width(width));
        }
        if segments.is_empty() {
            return Err(DescriptorError::NoSegments);
        }
        let mut seen_infinite = false;
        for (index, segment) in segments.iter().enumerate() {
            if seen_infinite {
                return Err(DescriptorError::UnreachableSegment { index });
            }
            if !segment.power.is_finite() {
                return Err(DescriptorError::SegmentPower {
                    index,
                    power: segment.power,
                });
            }
            seen_infinite = !segment.duration.is_finite();
        }
        Ok(Self {
            center_frequency,
            width,
            segments,
            looping,
        })
    }

    pub fn center_frequency(&self) -> f64 {
        self.center_frequency
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn segments(&self) -> &[SignalSegment] {
        &self.segments
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Duration of one pass through all segments, infinite if any segment is.
    pub fn total_duration(&self) -> SignalDuration {
        self.segments
            .iter()
            .fold(SignalDuration::ZERO, |total, segment| {
                total.saturating_add(segment.duration)
            })
    }

    /// Returns the power of the peak `elapsed` after the start of the simulation.
    ///
    /// A non-looping signal is off-air (power 0) once its schedule is exhausted.
    pub fn resolve_power(&self, elapsed: Duration) -> f64 {
        let total = self.total_duration();

        if !self.looping && total.has_elapsed(elapsed) {
            return 0.0;
        }

        let effective = match total {
            SignalDuration::Finite(period) if self.looping => {
                if period.is_zero() {
                    return 0.0;
                }
                wrap(elapsed, period)
            }
            _ => elapsed,
        };
        self.walk_segments(effective)
    }

    fn walk_segments(&self, effective: Duration) -> f64 {
        let effective = SignalDuration::Finite(effective);
        let mut cursor = SignalDuration::ZERO;
        for segment in &self.segments {
            cursor = cursor.saturating_add(segment.duration);
            if effective < cursor {
                return segment.power;
            }
        }
        0.0
    }
}

/// `elapsed mod period`, computed on whole nanoseconds so it is exact.
fn wrap(elapsed: Duration, period: Duration) -> Duration {
    let remainder = elapsed.as_nanos() % period.as_nanos();
    Duration::new(
        (remainder / NANOS_PER_SEC) as u64,
        (remainder % NANOS_PER_SEC) as u32,
    )
}
