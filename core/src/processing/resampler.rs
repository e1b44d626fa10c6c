//! Fits a frame of arbitrary length onto a row of pixels.
//!
//! When there are more points than pixels the [MaxHoldDownsampler] keeps the strongest point of
//! each pixel, so narrow peaks survive. Otherwise the [LinearUpsampler] interpolates between
//! neighbouring points. The [AdaptiveResampler] picks between the two on every call.
use crate::signal::SignalDataPoint;

/// Anything that carries a power value.
pub trait PowerSample {
    fn power(&self) -> f64;
}

impl PowerSample for f64 {
    fn power(&self) -> f64 {
        *self
    }
}

impl PowerSample for SignalDataPoint {
    fn power(&self) -> f64 {
        self.power
    }
}

pub trait SpectrumResampler {
    /// Resamples the power of `input` into every slot of `output`.
    ///
    /// An empty input fills the output with zeros.
    fn resample<P: PowerSample>(&mut self, input: &[P], output: &mut [f64]);
}

/// Splits the input into one contiguous bucket per output slot and keeps the maximum of each.
///
/// Bucket `i` spans `floor(i * n / m)..floor((i + 1) * n / m)`, so when `m` does not divide `n`
/// the bucket sizes differ by one and the larger buckets are spread across the row.
#[derive(Default, Clone, Copy, Debug)]
pub struct MaxHoldDownsampler;

impl SpectrumResampler for MaxHoldDownsampler {
    fn resample<P: PowerSample>(&mut self, input: &[P], output: &mut [f64]) {
        let input_len = input.len();
        let output_len = output.len();
        if input_len == 0 {
            output.fill(0.0);
            return;
        }

        for (i, slot) in output.iter_mut().enumerate() {
            let start = (i * input_len / output_len).min(input_len - 1);
            //  Only empty when there are fewer points than slots
            let end = ((i + 1) * input_len / output_len)
                .min(input_len)
                .max(start + 1);

            *slot = input
                .get(start..end)
                .map(|bucket| {
                    bucket
                        .iter()
                        .map(PowerSample::power)
                        .fold(f64::NEG_INFINITY, f64::max)
                })
                .unwrap_or_default();
        }
    }
}

/// Linearly interpolates between input points.
///
/// Input point `i` of `n` sits at `i / (n - 1)` and output slot `j` of `m` at `j / (m - 1)`,
/// so the first and last values are carried over exactly. The input positions are cached and
/// only recomputed when the input length changes.
#[derive(Default, Clone, Debug)]
pub struct LinearUpsampler {
    positions: Vec<f64>,
}

impl LinearUpsampler {
    /// Length of the input the cached positions were computed for.
    pub fn cached_len(&self) -> usize {
        self.positions.len()
    }

    fn refresh_positions(&mut self, input_len: usize) {
        if self.positions.len() != input_len {
            let last = (input_len - 1) as f64;
            self.positions = (0..input_len).map(|i| i as f64 / last).collect();
        }
    }

    fn interpolate<P: PowerSample>(&self, input: &[P], x: f64) -> f64 {
        //  First position to the right of `x`, kept inside the last interval
        let upper = self
            .positions
            .partition_point(|&position| position <= x)
            .clamp(1, input.len() - 1);
        let lower = upper - 1;

        match (
            self.positions.get(lower),
            self.positions.get(upper),
            input.get(lower),
            input.get(upper),
        ) {
            (Some(&x0), Some(&x1), Some(y0), Some(y1)) => {
                let (y0, y1) = (y0.power(), y1.power());
                if x >= x1 {
                    y1
                } else {
                    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
                }
            }
            _ => 0.0,
        }
    }
}

impl SpectrumResampler for LinearUpsampler {
    fn resample<P: PowerSample>(&mut self, input: &[P], output: &mut [f64]) {
        match input {
            [] => output.fill(0.0),
            [single] => output.fill(single.power()),
            _ => {
                self.refresh_positions(input.len());
                let last = output.len().saturating_sub(1);
                for (j, slot) in output.iter_mut().enumerate() {
                    let x = if last == 0 {
                        0.0
                    } else {
                        j as f64 / last as f64
                    };
                    *slot = self.interpolate(input, x);
                }
            }
        }
    }
}

/// Downsamples when the input is longer than the output, upsamples otherwise.
#[derive(Default, Clone, Debug)]
pub struct AdaptiveResampler<D = MaxHoldDownsampler, U = LinearUpsampler> {
    down: D,
    up: U,
}

impl<D, U> AdaptiveResampler<D, U>
where
    D: SpectrumResampler,
    U: SpectrumResampler,
{
    pub fn new(down: D, up: U) -> Self {
        Self { down, up }
    }

    pub fn downsampler(&self) -> &D {
        &self.down
    }

    pub fn upsampler(&self) -> &U {
        &self.up
    }
}

impl<D, U> SpectrumResampler for AdaptiveResampler<D, U>
where
    D: SpectrumResampler,
    U: SpectrumResampler,
{
    fn resample<P: PowerSample>(&mut self, input: &[P], output: &mut [f64]) {
        if input.len() > output.len() {
            self.down.resample(input, output)
        } else {
            self.up.resample(input, output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Spy {
        calls: usize,
    }

    impl SpectrumResampler for Spy {
        fn resample<P: PowerSample>(&mut self, _input: &[P], _output: &mut [f64]) {
            self.calls += 1;
        }
    }

    fn resample(input: &[f64], output_len: usize) -> Vec<f64> {
        let mut output = vec![f64::NAN; output_len];
        AdaptiveResampler::<MaxHoldDownsampler, LinearUpsampler>::default()
            .resample(input, &mut output);
        output
    }

    #[test]
    fn selects_strategy_by_length() {
        let mut resampler = AdaptiveResampler::new(Spy::default(), Spy::default());
        resampler.resample(&[0.0; 8], &mut [0.0; 4]);
        assert_eq!(resampler.downsampler().calls, 1);
        assert_eq!(resampler.upsampler().calls, 0);

        resampler.resample(&[0.0; 4], &mut [0.0; 8]);
        resampler.resample(&[0.0; 4], &mut [0.0; 4]);
        assert_eq!(resampler.downsampler().calls, 1);
        assert_eq!(resampler.upsampler().calls, 2);
    }

    #[test]
    fn downsample_even_buckets() {
        let input = [
            10.0, 1.0, 2.0, 20.0, 30.0, 3.0, 4.0, 40.0, 50.0, 5.0, 6.0, 60.0, 70.0, 7.0, 8.0,
            80.0, 90.0, 9.0, 10.0, 100.0,
        ];
        assert_eq!(
            resample(&input, 10),
            vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0]
        );
    }

    #[test]
    fn downsample_uneven_buckets() {
        //  Buckets are [0,2) [2,5) [5,8) [8,11) [11,14) [14,17) [17,20)
        let input = [
            10.0, 1.0, 2.0, 20.0, 3.0, 4.0, 5.0, 30.0, 40.0, 6.0, 7.0, 8.0, 50.0, 9.0, 11.0, 12.0,
            60.0, 70.0, 13.0, 14.0,
        ];
        assert_eq!(
            resample(&input, 7),
            vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0]
        );
    }

    #[test]
    fn downsample_holds_max_not_mean() {
        assert_eq!(resample(&[10.0, 1.0, 2.0, 20.0], 2), vec![10.0, 20.0]);
        assert_eq!(resample(&[-5.0, 3.0], 1), vec![3.0]);
        assert_eq!(
            resample(&[-100.0, -50.0, -80.0, -10.0], 2),
            vec![-50.0, -10.0]
        );
    }

    #[test]
    fn downsampler_tolerates_short_input() {
        let mut output = [f64::NAN; 4];
        MaxHoldDownsampler.resample(&[1.0, 2.0], &mut output);
        assert!(output.iter().all(|v| *v == 1.0 || *v == 2.0));
        MaxHoldDownsampler.resample::<f64>(&[], &mut output);
        assert_eq!(output, [0.0; 4]);
    }

    #[test]
    fn upsample_preserves_endpoints() {
        let output = resample(&[5.0, 15.0, 25.0, 35.0, 45.0], 50);
        assert_eq!(output[0], 5.0);
        assert_eq!(output[49], 45.0);
    }

    #[test]
    fn upsample_stays_in_range_and_monotonic() {
        let input = (0..10).map(|i| i as f64 * 10.0).collect::<Vec<_>>();
        let output = resample(&input, 100);
        assert!(output.iter().all(|v| (0.0..=90.0).contains(v)));
        assert!(output.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn upsample_constant_and_single_point() {
        for len in [4, 5, 20, 333] {
            assert!(resample(&[7.0, 7.0, 7.0, 7.0], len).iter().all(|v| *v == 7.0));
            assert!(resample(&[99.0], len).iter().all(|v| *v == 99.0));
        }
        assert_eq!(resample(&[99.0], 1), vec![99.0]);
    }

    #[test]
    fn upsample_hits_input_points() {
        //  3 points onto 5 slots puts every input point on a slot
        assert_eq!(resample(&[0.0, 10.0, 20.0], 5), vec![0.0, 5.0, 10.0, 15.0, 20.0]);
    }

    #[test]
    fn upsample_is_repeatable() {
        let mut upsampler = LinearUpsampler::default();
        let input = [0.0, 10.0, 20.0];
        let mut first = [0.0; 15];
        let mut second = [0.0; 15];
        upsampler.resample(&input, &mut first);
        assert_eq!(upsampler.cached_len(), 3);
        upsampler.resample(&input, &mut second);
        assert_eq!(first, second);

        //  A new input length refreshes the cache
        let mut third = [0.0; 15];
        upsampler.resample(&[0.0, 10.0, 20.0, 30.0], &mut third);
        assert_eq!(upsampler.cached_len(), 4);
        assert_eq!(third[14], 30.0);
    }

    #[test]
    fn empty_input_and_output() {
        assert_eq!(resample(&[], 3), vec![0.0; 3]);
        assert!(resample(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn resamples_signal_points() {
        let points = [
            SignalDataPoint::new(0.0, 1.0),
            SignalDataPoint::new(1.0, 4.0),
            SignalDataPoint::new(2.0, 2.0),
            SignalDataPoint::new(3.0, 3.0),
        ];
        let mut output = [0.0; 2];
        AdaptiveResampler::<MaxHoldDownsampler, LinearUpsampler>::default()
            .resample(&points, &mut output);
        assert_eq!(output, [4.0, 3.0]);
    }
}
