//! # Spectrum Core
//!
//! The streaming signal pipeline behind the spectrum and waterfall displays:
//! * Synthesizes frames of (frequency, power) points from a noise floor and any number of
//!   Gaussian peaks whose power follows a piecewise schedule.
//! * Produces one frame per tick on a background task and hands it to the consumer through a
//!   single-slot channel in which a newer frame replaces an unconsumed one.
//! * Normalizes each frame, resamples it to the pixel width of the display and writes it as a
//!   colour-mapped row into a scrolling ring buffer.
//!
pub mod channels;
pub mod config;
pub mod display;
pub mod frame;
pub mod generators;
pub mod metrics;
pub mod processing;
pub mod provider;
pub mod signal;
pub mod waterfall;

pub use channels::{LatestFrameReceiver, LatestFrameSender, latest_frame_channel};
pub use config::{ConfigError, PipelineConfig};
pub use display::SpectrumDisplay;
pub use frame::{Frame, FrequencyAxis, POINTS};
pub use generators::{CompositeGenerator, FrameGenerator, NoiseGenerator, PeakGenerator};
pub use processing::{AdaptiveResampler, SignalNormalizer};
pub use provider::{DataProvider, ProviderError};
pub use signal::{
    DescriptorError, SignalDataPoint, SignalDuration, SignalSegment, TimeVaryingSignalDescriptor,
};
pub use waterfall::{BlitSegments, ColorMapper, WaterfallError, WaterfallRingBuffer};
