//! Waveform generation seam
//!
//! The physics that turns injection parameters into a strain time series
//! lives outside this crate; [`WaveformGenerator`] is the boundary it plugs
//! into. Generators synthesize into a window chosen by the statistic engine
//! and may reject a record's parameters with a [`WaveformError`], which the
//! orchestrator contains or propagates depending on the error-handling mode.
//!
//! [`RingdownGenerator`] ships with the crate: an exponentially damped
//! sinusoid parameterized by `frequency`, `quality`, and `amplitude`. It is
//! enough to exercise the full pipeline and serves as the reference for what
//! an external model implementation looks like.

use std::f64::consts::PI;

use crate::injection::InjectionRecord;
use crate::types::{GpsSeconds, Sample};

/// Rejection of an injection's parameters by the waveform model.
#[derive(Debug, Clone, thiserror::Error)]
pub enum WaveformError {
    #[error("missing waveform parameter `{0}`")]
    MissingParameter(String),

    #[error("invalid waveform parameter `{name}` = {value}")]
    InvalidParameter { name: String, value: f64 },
}

/// External collaborator synthesizing the injected signal.
///
/// `generate` returns exactly `duration * sample_rate` samples covering
/// `[start_time, start_time + duration)` for the given sensor. The series is
/// zero wherever the signal is absent. Implementations are shared across
/// workers and must not carry per-call mutable state.
pub trait WaveformGenerator: Send + Sync {
    fn generate(
        &self,
        record: &InjectionRecord,
        sensor: &str,
        start_time: GpsSeconds,
        duration: f64,
        sample_rate: f64,
    ) -> Result<Vec<Sample>, WaveformError>;
}

/// Damped sinusoid starting at the record's reference time.
///
/// Parameters (all required, all positive):
/// - `frequency`: oscillation frequency in Hz
/// - `quality`: dimensionless quality factor; decay time is `Q / (pi f)`
/// - `amplitude`: peak strain amplitude
///
/// The same signal is produced at every sensor.
#[derive(Debug, Clone, Default)]
pub struct RingdownGenerator;

impl RingdownGenerator {
    pub fn new() -> Self {
        Self
    }

    fn positive_param(record: &InjectionRecord, name: &str) -> Result<f64, WaveformError> {
        let value = record
            .param(name)
            .ok_or_else(|| WaveformError::MissingParameter(name.to_string()))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(WaveformError::InvalidParameter {
                name: name.to_string(),
                value,
            });
        }
        Ok(value)
    }
}

impl WaveformGenerator for RingdownGenerator {
    fn generate(
        &self,
        record: &InjectionRecord,
        _sensor: &str,
        start_time: GpsSeconds,
        duration: f64,
        sample_rate: f64,
    ) -> Result<Vec<Sample>, WaveformError> {
        let frequency = Self::positive_param(record, "frequency")?;
        let quality = Self::positive_param(record, "quality")?;
        let amplitude = Self::positive_param(record, "amplitude")?;

        let decay_time = quality / (PI * frequency);
        let n = (duration * sample_rate).round() as usize;
        let delta_t = 1.0 / sample_rate;

        let series = (0..n)
            .map(|k| {
                let t = start_time + k as f64 * delta_t - record.reference_time;
                if t < 0.0 {
                    0.0
                } else {
                    amplitude * (-t / decay_time).exp() * (2.0 * PI * frequency * t).sin()
                }
            })
            .collect();
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record() -> InjectionRecord {
        InjectionRecord::new(1, 100.0)
            .with_param("frequency", 200.0)
            .with_param("quality", 30.0)
            .with_param("amplitude", 1.0)
    }

    #[test]
    fn test_series_length_and_leading_zeros() {
        let gen = RingdownGenerator::new();
        let series = gen.generate(&record(), "h1", 96.0, 8.0, 1024.0).unwrap();
        assert_eq!(series.len(), 8192);
        // Signal starts 4 s into the window.
        assert!(series[..4 * 1024].iter().all(|&x| x == 0.0));
        assert!(series[4 * 1024 + 1..4 * 1024 + 10].iter().any(|&x| x != 0.0));
    }

    #[test]
    fn test_energy_matches_damped_sinusoid() {
        // For Q >> 1 the signal energy is A^2 * tau / 4.
        let gen = RingdownGenerator::new();
        let sample_rate = 8192.0;
        let series = gen
            .generate(&record(), "h1", 100.0, 4.0, sample_rate)
            .unwrap();
        let energy: f64 = series.iter().map(|x| x * x).sum::<f64>() / sample_rate;
        let tau = 30.0 / (PI * 200.0);
        assert_relative_eq!(energy, tau / 4.0, max_relative = 0.02);
    }

    #[test]
    fn test_missing_parameter_rejected() {
        let gen = RingdownGenerator::new();
        let bad = InjectionRecord::new(2, 100.0).with_param("frequency", 200.0);
        let err = gen.generate(&bad, "h1", 96.0, 8.0, 1024.0).unwrap_err();
        assert!(matches!(err, WaveformError::MissingParameter(name) if name == "quality"));
    }

    #[test]
    fn test_nonpositive_parameter_rejected() {
        let gen = RingdownGenerator::new();
        let bad = record().with_param("frequency", -5.0);
        let err = gen.generate(&bad, "h1", 96.0, 8.0, 1024.0).unwrap_err();
        assert!(matches!(
            err,
            WaveformError::InvalidParameter { name, .. } if name == "frequency"
        ));
    }

    #[test]
    fn test_signal_decays() {
        let gen = RingdownGenerator::new();
        let series = gen.generate(&record(), "h1", 100.0, 4.0, 8192.0).unwrap();
        let early: f64 = series[..1024].iter().map(|x| x * x).sum();
        let late: f64 = series[series.len() - 1024..].iter().map(|x| x * x).sum();
        assert!(late < early * 1e-3);
    }
}
