use super::{FrameGenerator, clock_seeded_rng};
use crate::{
    frame::{Frame, FrequencyAxis},
    signal::SignalDuration,
};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal, NormalError};
use serde::Deserialize;
use std::time::Duration;

/// Level and spread of the noise floor, in dBm.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NoiseParameters {
    /// Mean power of the noise floor.
    pub base_level: f64,
    /// Standard deviation of the noise around the base level.
    pub random_level: f64,
}

impl Default for NoiseParameters {
    fn default() -> Self {
        Self {
            base_level: -100.0,
            random_level: 2.5,
        }
    }
}

/// Fills a frame with `base_level + N(0, 1) * random_level` at every point.
///
/// The noise is redrawn on every call and does not depend on the elapsed time.
pub struct NoiseGenerator<const N: usize> {
    axis: FrequencyAxis,
    distribution: Normal<f64>,
    rng: StdRng,
}

impl<const N: usize> NoiseGenerator<N> {
    pub fn new(axis: FrequencyAxis, parameters: NoiseParameters) -> Result<Self, NormalError> {
        Ok(Self {
            axis,
            distribution: Normal::new(parameters.base_level, parameters.random_level)?,
            rng: clock_seeded_rng(),
        })
    }

    pub fn axis(&self) -> &FrequencyAxis {
        &self.axis
    }
}

impl<const N: usize> FrameGenerator<N> for NoiseGenerator<N> {
    fn render(&mut self, _elapsed: Duration, frame: &mut Frame<N>) {
        for (index, point) in frame.iter_mut().enumerate() {
            point.frequency = self.axis.frequency_at(index, N);
            point.power = self.distribution.sample(&mut self.rng);
        }
    }

    fn total_duration(&self) -> SignalDuration {
        SignalDuration::Infinite
    }
}
