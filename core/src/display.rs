//! The consumer stage of the pipeline.
//!
//! Every frame taken from the hand-off channel is normalized, resampled to the width of the
//! waterfall and written into it as a new row. A second resampled row at the width of the
//! spectrum plot is kept alongside the most recent normalized frame.
use crate::{
    channels::LatestFrameReceiver,
    frame::{Frame, POINTS},
    metrics::{FrameMetrics, FrameMetricsSnapshot},
    processing::{AdaptiveResampler, SignalNormalizer, SpectrumResampler},
    waterfall::{ColorMapper, WaterfallError, WaterfallRingBuffer},
};
use std::{future::Future, sync::Arc};
use tokio::select;
use tracing::{debug, info, instrument, warn};

pub struct SpectrumDisplay<const N: usize = POINTS> {
    normalizer: SignalNormalizer,
    waterfall_resampler: AdaptiveResampler,
    spectrum_resampler: AdaptiveResampler,
    waterfall: WaterfallRingBuffer,
    waterfall_row: Vec<f64>,
    spectrum_row: Vec<f64>,
    latest: Option<Frame<N>>,
    metrics: FrameMetrics,
}

impl<const N: usize> SpectrumDisplay<N> {
    /// Creates a display with an unallocated waterfall and an empty spectrum row.
    pub fn new(normalizer: SignalNormalizer, color_mapper: Arc<ColorMapper>) -> Self {
        Self {
            normalizer,
            waterfall_resampler: AdaptiveResampler::default(),
            spectrum_resampler: AdaptiveResampler::default(),
            waterfall: WaterfallRingBuffer::new(color_mapper),
            waterfall_row: Vec::new(),
            spectrum_row: Vec::new(),
            latest: None,
            metrics: FrameMetrics::new(),
        }
    }

    /// Resizes the waterfall in pixels, clearing it. Returns false if either dimension is zero.
    pub fn resize(&mut self, width: usize, height: usize) -> bool {
        let resized = self.waterfall.resize(width, height);
        if resized {
            self.waterfall_row.resize(width, 0.0);
        }
        resized
    }

    /// Resizes the waterfall to a logical size at the given display scaling.
    pub fn resize_logical(&mut self, width: f64, height: f64, scaling: f64) -> bool {
        let resized = self.waterfall.resize_logical(width, height, scaling);
        if resized {
            self.waterfall_row.resize(self.waterfall.width(), 0.0);
        }
        resized
    }

    /// Sets the number of points of the spectrum row, zero disables it.
    pub fn set_spectrum_width(&mut self, width: usize) {
        self.spectrum_row.resize(width, 0.0);
    }

    /// Takes one frame through the pipeline.
    ///
    /// The waterfall row is skipped while the waterfall is unallocated.
    pub fn process(&mut self, mut frame: Frame<N>) -> Result<(), WaterfallError> {
        self.normalizer.normalize(&mut frame);

        if self.waterfall.is_allocated() {
            self.waterfall_resampler
                .resample(&*frame, &mut self.waterfall_row);
            self.waterfall.write_row(&self.waterfall_row)?;
        }
        if !self.spectrum_row.is_empty() {
            self.spectrum_resampler
                .resample(&*frame, &mut self.spectrum_row);
        }

        self.latest = Some(frame);
        self.metrics.record_frame();
        Ok(())
    }

    /// Processes frames until the channel closes or `cancel` resolves.
    ///
    /// Returns the display so the caller can read the final state.
    #[instrument(skip_all)]
    pub async fn run<C>(mut self, mut frames: LatestFrameReceiver<N>, cancel: C) -> Self
    where
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);
        loop {
            select! {
                biased;
                _ = &mut cancel => {
                    debug!("Display cancelled");
                    break;
                }
                frame = frames.recv() => match frame {
                    Some(frame) => {
                        if let Err(e) = self.process(frame) {
                            warn!("{e}");
                        }
                    }
                    None => {
                        info!("Frame channel closed");
                        break;
                    }
                }
            }
        }
        self
    }

    pub fn waterfall(&self) -> &WaterfallRingBuffer {
        &self.waterfall
    }

    /// The latest frame resampled to the spectrum width, normalized.
    pub fn spectrum_row(&self) -> &[f64] {
        &self.spectrum_row
    }

    /// The latest frame, normalized.
    pub fn latest_frame(&self) -> Option<&Frame<N>> {
        self.latest.as_ref()
    }

    pub fn frame_metrics(&self) -> FrameMetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        channels::latest_frame_channel,
        config::{PipelineConfig, SegmentConfig, SignalConfig},
        provider::DataProvider,
        signal::SignalDataPoint,
    };
    use std::time::Duration;

    fn display<const N: usize>() -> SpectrumDisplay<N> {
        SpectrumDisplay::new(SignalNormalizer::default(), Arc::default())
    }

    fn frame(powers: [f64; 4]) -> Frame<4> {
        Frame::from(powers.map(|power| SignalDataPoint::new(0.0, power)))
    }

    #[test]
    fn process_normalizes_resamples_and_writes() {
        let mut display = display::<4>();
        assert!(display.resize(2, 3));
        display.set_spectrum_width(8);

        display
            .process(frame([-120.0, -70.0, -20.0, -120.0]))
            .unwrap();

        let latest = display.latest_frame().unwrap();
        assert_eq!(
            latest.powers().collect::<Vec<_>>(),
            vec![0.0, 0.5, 1.0, 0.0]
        );

        //  Max-hold over [0, 0.5] and [1, 0]
        let mapper = ColorMapper::new();
        let waterfall = display.waterfall();
        assert_eq!(waterfall.filled_rows(), 1);
        assert_eq!(
            waterfall.row(0),
            Some([mapper.get_color(0.5), mapper.get_color(1.0)].as_slice())
        );

        let spectrum = display.spectrum_row();
        assert_eq!(spectrum.len(), 8);
        assert_eq!(spectrum[0], 0.0);
        assert_eq!(spectrum[7], 0.0);
    }

    #[test]
    fn unallocated_waterfall_is_skipped() {
        let mut display = display::<4>();
        display.process(frame([-70.0; 4])).unwrap();
        assert_eq!(display.waterfall().filled_rows(), 0);
        assert!(display.spectrum_row().is_empty());
        assert!(display.latest_frame().is_some());
    }

    #[test]
    fn resize_logical_follows_scaling() {
        let mut display = display::<4>();
        assert!(display.resize_logical(4.0, 2.0, 2.0));
        assert!(!display.resize_logical(0.0, 2.0, 2.0));
        display.process(frame([-70.0; 4])).unwrap();
        assert_eq!(display.waterfall().width(), 8);
        assert_eq!(display.waterfall().height(), 4);
        assert_eq!(display.waterfall().filled_rows(), 1);
    }

    #[tokio::test]
    async fn run_drains_until_channel_closes() {
        let (sender, receiver) = latest_frame_channel();
        let mut display = display::<4>();
        display.resize(4, 4);

        sender.send(frame([-70.0; 4])).unwrap();
        drop(sender);

        let display = display.run(receiver, std::future::pending()).await;
        assert_eq!(display.waterfall().filled_rows(), 1);
    }

    #[tokio::test]
    async fn run_returns_when_finite_schedule_ends() {
        let config = PipelineConfig {
            signals: vec![SignalConfig {
                center_frequency_mhz: 100.0,
                width_mhz: 0.5,
                segments: vec![SegmentConfig {
                    duration_ms: Some(50),
                    power: 40.0,
                }],
                looping: false,
            }],
            ..PipelineConfig::default()
        };
        let (mut provider, frames) = DataProvider::new(
            config.build_generator::<64>().unwrap(),
            Duration::from_millis(10),
        );
        let mut display = SpectrumDisplay::new(config.normalizer().unwrap(), Arc::default());
        display.resize(32, 64);

        provider.start().await.unwrap();
        let display = tokio::time::timeout(
            Duration::from_secs(1),
            display.run(frames, std::future::pending()),
        )
        .await
        .unwrap();
        provider.stop().await.unwrap();

        assert!(display.waterfall().filled_rows() > 0);
    }

    #[tokio::test]
    async fn pipeline_end_to_end() {
        let config = PipelineConfig::default();
        let (mut provider, frames) = DataProvider::new(
            config.build_generator::<256>().unwrap(),
            Duration::from_millis(10),
        );
        let mut display = SpectrumDisplay::new(config.normalizer().unwrap(), Arc::default());
        display.resize(128, 64);
        display.set_spectrum_width(512);

        provider.start().await.unwrap();
        let display = display
            .run(frames, tokio::time::sleep(Duration::from_millis(200)))
            .await;
        provider.stop().await.unwrap();

        let waterfall = display.waterfall();
        assert!(waterfall.filled_rows() > 2);
        assert_eq!(waterfall.segments().len(), waterfall.filled_rows());
        assert!(display.latest_frame().is_some());
        assert!(display.frame_metrics().current_fps > 0.0);
    }
}
