use crate::signal::SignalDataPoint;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CalibrationError {
    #[error("Power floor and ceiling must be finite, got {floor} and {ceiling}")]
    NotFinite { floor: f64, ceiling: f64 },
    #[error("Power ceiling {ceiling} must be above the power floor {floor}")]
    EmptyRange { floor: f64, ceiling: f64 },
}

/// Maps power linearly so that the floor lands on `0.0` and the ceiling on `1.0`.
///
/// Nothing is clamped: powers below the floor become negative and powers above the ceiling
/// exceed one. Clamping is left to whoever draws the values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SignalNormalizer {
    power_floor: f64,
    range: f64,
}

impl SignalNormalizer {
    pub fn new(power_floor: f64, power_ceiling: f64) -> Result<Self, CalibrationError> {
        if !power_floor.is_finite() || !power_ceiling.is_finite() {
            return Err(CalibrationError::NotFinite {
                floor: power_floor,
                ceiling: power_ceiling,
            });
        }
        if power_ceiling <= power_floor {
            return Err(CalibrationError::EmptyRange {
                floor: power_floor,
                ceiling: power_ceiling,
            });
        }
        Ok(Self {
            power_floor,
            range: power_ceiling - power_floor,
        })
    }

    pub fn power_floor(&self) -> f64 {
        self.power_floor
    }

    pub fn power_ceiling(&self) -> f64 {
        self.power_floor + self.range
    }

    pub fn normalize_value(&self, power: f64) -> f64 {
        (power - self.power_floor) / self.range
    }

    /// Normalizes the power of every point in place.
    pub fn normalize(&self, points: &mut [SignalDataPoint]) {
        for point in points {
            point.power = self.normalize_value(point.power);
        }
    }
}

impl Default for SignalNormalizer {
    /// Calibrated for -120 dBm to -20 dBm.
    fn default() -> Self {
        Self {
            power_floor: -120.0,
            range: 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(power: f64) -> [SignalDataPoint; 1] {
        [SignalDataPoint::new(100.0, power)]
    }

    #[test]
    fn floor_ceiling_and_midpoint() {
        let normalizer = SignalNormalizer::default();
        let mut points = [
            SignalDataPoint::new(0.0, -120.0),
            SignalDataPoint::new(1.0, -20.0),
            SignalDataPoint::new(2.0, -70.0),
        ];
        normalizer.normalize(&mut points);
        assert_eq!(points[0].power, 0.0);
        assert_eq!(points[1].power, 1.0);
        assert_eq!(points[2].power, 0.5);
        assert_eq!(points[2].frequency, 2.0);
    }

    #[test]
    fn values_are_not_clamped() {
        let normalizer = SignalNormalizer::default();
        let mut below = frame(-130.0);
        let mut above = frame(-10.0);
        normalizer.normalize(&mut below);
        normalizer.normalize(&mut above);
        assert!(below[0].power < 0.0);
        assert!(above[0].power > 1.0);
    }

    #[test]
    fn empty_frame_is_a_no_op() {
        SignalNormalizer::default().normalize(&mut []);
    }

    #[test]
    fn custom_calibration() {
        let normalizer = SignalNormalizer::new(-100.0, 0.0).unwrap();
        assert_eq!(normalizer.power_ceiling(), 0.0);
        assert_eq!(normalizer.normalize_value(-25.0), 0.75);
    }

    #[test]
    fn rejects_inverted_range() {
        assert_eq!(
            SignalNormalizer::new(-20.0, -120.0),
            Err(CalibrationError::EmptyRange {
                floor: -20.0,
                ceiling: -120.0
            })
        );
        assert!(SignalNormalizer::new(f64::NEG_INFINITY, 0.0).is_err());
    }
}
