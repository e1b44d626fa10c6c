use super::{FrameGenerator, clock_seeded_rng};
use crate::{
    frame::{Frame, FrequencyAxis},
    signal::{SignalDuration, TimeVaryingSignalDescriptor},
};
use rand::{Rng, rngs::StdRng};
use std::{ops::Range, time::Duration};

/// Beyond this many standard deviations the Gaussian is below 3.4e-4 and is treated as zero.
const CUTOFF_SIGMAS: f64 = 4.0;

/// Integer jitter added to every point inside the cutoff.
const JITTER: Range<i32> = -5..5;

/// Produces the contribution of a single time-varying Gaussian peak, without any noise floor.
///
/// `contribution_i = power * exp(-delta_i² / (2 * width²)) + jitter` where `delta_i` is the
/// distance of point `i` from the centre frequency.
pub struct PeakGenerator<const N: usize> {
    axis: FrequencyAxis,
    descriptor: TimeVaryingSignalDescriptor,
    two_sigma_squared: f64,
    cutoff: f64,
    rng: StdRng,
}

impl<const N: usize> PeakGenerator<N> {
    pub fn new(axis: FrequencyAxis, descriptor: TimeVaryingSignalDescriptor) -> Self {
        let width = descriptor.width();
        Self {
            axis,
            two_sigma_squared: 2.0 * width * width,
            cutoff: CUTOFF_SIGMAS * width,
            descriptor,
            rng: clock_seeded_rng(),
        }
    }

    pub fn descriptor(&self) -> &TimeVaryingSignalDescriptor {
        &self.descriptor
    }
}

impl<const N: usize> FrameGenerator<N> for PeakGenerator<N> {
    fn render(&mut self, elapsed: Duration, frame: &mut Frame<N>) {
        let power = self.descriptor.resolve_power(elapsed);
        let center = self.descriptor.center_frequency();

        for (index, point) in frame.iter_mut().enumerate() {
            point.frequency = self.axis.frequency_at(index, N);

            //  Off-air, skip the exponential entirely
            if power == 0.0 {
                point.power = 0.0;
                continue;
            }

            let delta = point.frequency - center;
            point.power = if delta.abs() > self.cutoff {
                0.0
            } else {
                power * f64::exp(-(delta * delta) / self.two_sigma_squared)
                    + self.rng.random_range(JITTER) as f64
            };
        }
    }

    fn total_duration(&self) -> SignalDuration {
        if self.descriptor.is_looping() {
            SignalDuration::Infinite
        } else {
            self.descriptor.total_duration()
        }
    }
}
