//! Generators synthesize one [Frame] per tick from the elapsed simulation time.
//!
//! A [NoiseGenerator] supplies the noise floor and the frequency axis, [PeakGenerator]s supply
//! the contribution of individual signals, and a [CompositeGenerator] adds them together.
pub mod composite;
pub mod noise;
pub mod peak;

pub use composite::CompositeGenerator;
pub use noise::{NoiseGenerator, NoiseParameters};
pub use peak::PeakGenerator;

use crate::{frame::Frame, signal::SignalDuration};
use chrono::Utc;
use rand::{SeedableRng, rngs::StdRng};
use std::time::Duration;

/// Implement for anything that can produce frames of `N` points.
pub trait FrameGenerator<const N: usize>: Send {
    /// Overwrites every point of `frame` with the output for the given elapsed time.
    fn render(&mut self, elapsed: Duration, frame: &mut Frame<N>);

    /// How long this generator produces meaningful output.
    fn total_duration(&self) -> SignalDuration;

    /// Produces a freshly allocated frame for the given elapsed time.
    fn generate(&mut self, elapsed: Duration) -> Frame<N> {
        let mut frame = Frame::zeroed();
        self.render(elapsed, &mut frame);
        frame
    }
}

impl<const N: usize, G> FrameGenerator<N> for Box<G>
where
    G: FrameGenerator<N> + ?Sized,
{
    fn render(&mut self, elapsed: Duration, frame: &mut Frame<N>) {
        (**self).render(elapsed, frame)
    }

    fn total_duration(&self) -> SignalDuration {
        (**self).total_duration()
    }
}

/// Random source for the generators, the output is not meant to be reproducible.
pub(crate) fn clock_seeded_rng() -> StdRng {
    StdRng::seed_from_u64(Utc::now().timestamp_subsec_nanos() as u64)
}
