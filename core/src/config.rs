//! JSON configuration of the pipeline.
//!
//! Every field is optional, anything left out takes the value of [PipelineConfig::default],
//! which reproduces the reference setup of three looping peaks over a 90 to 110 MHz band.
use crate::{
    frame::FrequencyAxis,
    generators::{CompositeGenerator, NoiseGenerator, NoiseParameters, PeakGenerator},
    processing::{CalibrationError, SignalNormalizer},
    provider::{DEFAULT_UPDATE_RATE_HZ, period_for_rate},
    signal::{DescriptorError, SignalSegment, TimeVaryingSignalDescriptor},
};
use rand_distr::NormalError;
use serde::Deserialize;
use std::{fs, path::Path, time::Duration};
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Frequency axis must be finite and increasing, got {start} to {end} MHz")]
    FrequencyAxis { start: f64, end: f64 },
    #[error("Invalid calibration: {0}")]
    Calibration(#[from] CalibrationError),
    #[error("Invalid noise parameters: {0}")]
    Noise(#[from] NormalError),
    #[error("Update rate must be above zero")]
    UpdateRate,
    #[error("Signal {index} is invalid: {source}")]
    Signal {
        index: usize,
        #[source]
        source: DescriptorError,
    },
}

/// Power that maps onto the bottom and top of the colour scale, in dBm.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Calibration {
    pub power_floor: f64,
    pub power_ceiling: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            power_floor: -120.0,
            power_ceiling: -20.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SegmentConfig {
    /// Left out for a segment that never ends.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    pub power: f64,
}

impl From<SegmentConfig> for SignalSegment {
    fn from(segment: SegmentConfig) -> Self {
        match segment.duration_ms {
            Some(millis) => SignalSegment::new(Duration::from_millis(millis), segment.power),
            None => SignalSegment::infinite(segment.power),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SignalConfig {
    pub center_frequency_mhz: f64,
    pub width_mhz: f64,
    pub segments: Vec<SegmentConfig>,
    #[serde(rename = "loop", default)]
    pub looping: bool,
}

impl SignalConfig {
    fn looping(center_frequency_mhz: f64, width_mhz: f64, schedule: &[(u64, f64)]) -> Self {
        Self {
            center_frequency_mhz,
            width_mhz,
            segments: schedule
                .iter()
                .map(|&(seconds, power)| SegmentConfig {
                    duration_ms: Some(seconds * 1000),
                    power,
                })
                .collect(),
            looping: true,
        }
    }

    pub fn descriptor(&self) -> Result<TimeVaryingSignalDescriptor, DescriptorError> {
        TimeVaryingSignalDescriptor::new(
            self.center_frequency_mhz,
            self.width_mhz,
            self.segments.iter().copied().map(Into::into).collect(),
            self.looping,
        )
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PipelineConfig {
    pub frequency_axis: FrequencyAxis,
    pub noise: NoiseParameters,
    pub calibration: Calibration,
    pub update_rate_hz: u32,
    pub signals: Vec<SignalConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frequency_axis: FrequencyAxis::default(),
            noise: NoiseParameters::default(),
            calibration: Calibration::default(),
            update_rate_hz: DEFAULT_UPDATE_RATE_HZ,
            signals: vec![
                SignalConfig::looping(100.0, 0.5, &[(5, 60.0), (3, 20.0), (5, 60.0)]),
                SignalConfig::looping(95.0, 0.5, &[(1, 61.0), (2, 50.0), (3, 60.0), (3, 40.0)]),
                SignalConfig::looping(
                    106.0,
                    1.0,
                    &[(1, 61.0), (2, 50.0), (3, 60.0), (3, 40.0), (5, 0.0)],
                ),
            ],
        }
    }
}

impl PipelineConfig {
    /// Parses and validates a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    #[instrument(skip_all, fields(path = %path.display()), err(level = "error"))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::from_json(&fs::read_to_string(path)?)?;
        info!("Loaded config with {} signals", config.signals.len());
        Ok(config)
    }

    /// Checks everything that would otherwise fail when the pipeline is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let FrequencyAxis { start, end } = self.frequency_axis;
        if !start.is_finite() || !end.is_finite() || start >= end {
            return Err(ConfigError::FrequencyAxis { start, end });
        }
        self.normalizer()?;
        self.tick_period()?;
        NoiseGenerator::<1>::new(self.frequency_axis, self.noise)?;
        self.descriptors()?;
        Ok(())
    }

    pub fn descriptors(&self) -> Result<Vec<TimeVaryingSignalDescriptor>, ConfigError> {
        self.signals
            .iter()
            .enumerate()
            .map(|(index, signal)| {
                signal
                    .descriptor()
                    .map_err(|source| ConfigError::Signal { index, source })
            })
            .collect()
    }

    /// Builds the noise floor with one peak per configured signal.
    pub fn build_generator<const N: usize>(&self) -> Result<CompositeGenerator<N>, ConfigError> {
        let noise = NoiseGenerator::<N>::new(self.frequency_axis, self.noise)?;
        let generator = self
            .descriptors()?
            .into_iter()
            .fold(CompositeGenerator::new(noise), |generator, descriptor| {
                generator.with_peak(PeakGenerator::<N>::new(self.frequency_axis, descriptor))
            });
        Ok(generator)
    }

    pub fn normalizer(&self) -> Result<SignalNormalizer, ConfigError> {
        Ok(SignalNormalizer::new(
            self.calibration.power_floor,
            self.calibration.power_ceiling,
        )?)
    }

    pub fn tick_period(&self) -> Result<Duration, ConfigError> {
        period_for_rate(self.update_rate_hz).ok_or(ConfigError::UpdateRate)
    }
}
