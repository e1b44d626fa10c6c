//! Per-frame processing applied by the consumer before a frame is displayed.
pub mod normalizer;
pub mod resampler;

pub use normalizer::{CalibrationError, SignalNormalizer};
pub use resampler::{
    AdaptiveResampler, LinearUpsampler, MaxHoldDownsampler, PowerSample, SpectrumResampler,
};
