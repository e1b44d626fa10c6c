//! Fixed-length frames of signal points and the frequency axis they are laid out on.
use crate::signal::SignalDataPoint;
use serde::Deserialize;
use std::ops::{Deref, DerefMut};

/// Number of points in every frame of the default pipeline.
pub const POINTS: usize = 1024;

/// One frame of `N` signal points.
///
/// A frame has a single owner at any time: it is created by a generator, moved through the
/// hand-off channel and finally consumed by the display.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<const N: usize = POINTS>(Box<[SignalDataPoint; N]>);

impl<const N: usize> Frame<N> {
    /// Creates a frame with every point at zero frequency and zero power.
    pub fn zeroed() -> Self {
        Self(Box::new([SignalDataPoint::default(); N]))
    }

    /// Creates a zero-power frame whose frequencies follow the given axis.
    pub fn on_axis(axis: &FrequencyAxis) -> Self {
        let mut frame = Self::zeroed();
        axis.apply(&mut frame);
        frame
    }

    /// Iterates over the power of each point.
    pub fn powers(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|point| point.power)
    }
}

impl<const N: usize> Default for Frame<N> {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl<const N: usize> From<[SignalDataPoint; N]> for Frame<N> {
    fn from(points: [SignalDataPoint; N]) -> Self {
        Self(Box::new(points))
    }
}

impl<const N: usize> Deref for Frame<N> {
    type Target = [SignalDataPoint];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl<const N: usize> DerefMut for Frame<N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut_slice()
    }
}

/// The frequency range covered by a frame.
///
/// Point `i` of an `N` point frame sits at `start + i * (end - start) / N`, so the last point
/// falls one step short of `end`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FrequencyAxis {
    #[serde(rename = "start-mhz")]
    pub start: f64,
    #[serde(rename = "end-mhz")]
    pub end: f64,
}

impl FrequencyAxis {
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Spacing between consecutive points of an `points` point frame.
    pub fn step(&self, points: usize) -> f64 {
        (self.end - self.start) / points as f64
    }

    /// Frequency of point `index` of an `points` point frame.
    pub fn frequency_at(&self, index: usize, points: usize) -> f64 {
        self.start + index as f64 * self.step(points)
    }

    /// Overwrites the frequency of every point in `points`, leaving the power untouched.
    pub fn apply(&self, points: &mut [SignalDataPoint]) {
        let len = points.len();
        for (index, point) in points.iter_mut().enumerate() {
            point.frequency = self.frequency_at(index, len);
        }
    }
}

impl Default for FrequencyAxis {
    fn default() -> Self {
        Self::new(90.0, 110.0)
    }
}
