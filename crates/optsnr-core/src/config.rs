//! Batch configuration
//!
//! The recognized options of a batch run, deserializable from YAML the same
//! way the surrounding tooling passes them in. Everything has a default so a
//! config file only needs to state what differs.
//!
//! ## Example
//!
//! ```rust
//! use optsnr_core::config::BatchConfig;
//!
//! let config = BatchConfig::from_yaml(r#"
//! low_frequency_cutoff: 30.0
//! segment_length: 256.0
//! sample_rate: 16384.0
//! worker_count: 8
//! sensor_output_columns:
//!   h1: snr_h1
//!   l1: snr_l1
//! "#).unwrap();
//! assert_eq!(config.worker_count, 8);
//! config.validate().unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::spectrum::SpectrumShape;

/// Error type for configuration loading and validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Recognized options of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Lowest frequency contributing to the statistic, in Hz.
    pub low_frequency_cutoff: f64,
    /// Optional upper frequency bound; `None` means Nyquist.
    pub high_frequency_cutoff: Option<f64>,
    /// Analysis window length in seconds.
    pub segment_length: f64,
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Output column name per sensor. Sensors are processed in the map's
    /// (sorted) key order, so iteration order is fixed.
    pub sensor_output_columns: BTreeMap<String, String>,
    /// Fixed size of the worker pool.
    pub worker_count: usize,
    /// Contain waveform-generation failures per (record, sensor) instead of
    /// aborting the batch.
    pub permissive_waveform_errors: bool,
    /// Paths of per-sensor time-varying spectrum archives, when the run uses
    /// a time-indexed bank instead of one fixed spectrum.
    pub time_varying_spectrum_files: Option<Vec<PathBuf>>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            low_frequency_cutoff: 30.0,
            high_frequency_cutoff: None,
            segment_length: 256.0,
            sample_rate: 16384.0,
            sensor_output_columns: BTreeMap::new(),
            worker_count: 1,
            permissive_waveform_errors: false,
            time_varying_spectrum_files: None,
        }
    }
}

impl BatchConfig {
    /// Parse from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml(&content)
    }

    /// Check internal consistency. Called before any processing starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segment_length <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "segment_length must be positive, got {}",
                self.segment_length
            )));
        }
        if self.sample_rate <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "sample_rate must be positive, got {}",
                self.sample_rate
            )));
        }
        let samples = self.segment_length * self.sample_rate;
        if (samples - samples.round()).abs() > 1e-9 {
            return Err(ConfigError::Invalid(format!(
                "segment_length * sample_rate must be a whole number of samples, got {samples}"
            )));
        }
        if self.low_frequency_cutoff < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "low_frequency_cutoff must be non-negative, got {}",
                self.low_frequency_cutoff
            )));
        }
        if let Some(f_high) = self.high_frequency_cutoff {
            if f_high <= self.low_frequency_cutoff {
                return Err(ConfigError::Invalid(format!(
                    "high_frequency_cutoff {} must exceed low_frequency_cutoff {}",
                    f_high, self.low_frequency_cutoff
                )));
            }
        }
        if self.worker_count == 0 {
            return Err(ConfigError::Invalid(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if self.sensor_output_columns.is_empty() {
            return Err(ConfigError::Invalid(
                "sensor_output_columns must name at least one sensor".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of time-domain samples in one analysis window.
    pub fn segment_samples(&self) -> usize {
        (self.segment_length * self.sample_rate).round() as usize
    }

    /// Spectrum shape every provider must conform to.
    pub fn spectrum_shape(&self) -> SpectrumShape {
        SpectrumShape::from_analysis(
            self.segment_length,
            self.sample_rate,
            self.low_frequency_cutoff,
        )
    }
}
