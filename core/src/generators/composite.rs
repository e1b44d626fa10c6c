use super::FrameGenerator;
use crate::{frame::Frame, signal::SignalDuration};
use std::time::Duration;

/// Adds the power of any number of peak generators on top of a base generator.
///
/// The base (normally a [NoiseGenerator](super::NoiseGenerator)) provides the frequency axis of
/// the output, the peaks only contribute power and must be laid out on the same axis.
pub struct CompositeGenerator<const N: usize> {
    base: Box<dyn FrameGenerator<N>>,
    peaks: Vec<Box<dyn FrameGenerator<N>>>,
    scratch: Frame<N>,
}

impl<const N: usize> CompositeGenerator<N> {
    pub fn new(base: impl FrameGenerator<N> + 'static) -> Self {
        Self {
            base: Box::new(base),
            peaks: Vec::new(),
            scratch: Frame::zeroed(),
        }
    }

    /// Adds a peak generator, consuming and returning the composite.
    pub fn with_peak(mut self, peak: impl FrameGenerator<N> + 'static) -> Self {
        self.push_peak(peak);
        self
    }

    pub fn push_peak(&mut self, peak: impl FrameGenerator<N> + 'static) {
        self.peaks.push(Box::new(peak));
    }

    pub fn num_peaks(&self) -> usize {
        self.peaks.len()
    }
}

impl<const N: usize> FrameGenerator<N> for CompositeGenerator<N> {
    fn render(&mut self, elapsed: Duration, frame: &mut Frame<N>) {
        self.base.render(elapsed, frame);

        for peak in &mut self.peaks {
            peak.render(elapsed, &mut self.scratch);
            for (point, contribution) in frame.iter_mut().zip(self.scratch.iter()) {
                point.power += contribution.power;
            }
        }
    }

    /// The longest duration of the peaks, the base is not considered.
    ///
    /// Unbounded if any peak is unbounded, or if there are no peaks at all.
    fn total_duration(&self) -> SignalDuration {
        self.peaks
            .iter()
            .map(|peak| peak.total_duration())
            .max()
            .unwrap_or(SignalDuration::Infinite)
    }
}
