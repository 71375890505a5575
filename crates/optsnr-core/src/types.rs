//! Core types for batch optimal-SNR computation
//!
//! Defines the scalar aliases, the dynamic-range scale applied to strain-order
//! quantities, and the error enum shared across the crate.
//!
//! ## Dynamic-range scaling
//!
//! Interferometric strain amplitudes sit around 1e-21 and one-sided noise
//! spectral densities around 1e-46. Squaring and dividing quantities that
//! small wastes most of the float exponent range, so every generated time
//! series is multiplied by [`DYN_RANGE_SCALE`] and every stored spectrum by
//! its square. The factor cancels exactly in the sigma statistic.

use crate::config::ConfigError;
use crate::provider::SpectrumLoadError;
use crate::waveform::WaveformError;

/// A real-valued time-domain sample.
pub type Sample = f64;

/// A GPS timestamp in seconds.
pub type GpsSeconds = f64;

/// Scale factor for strain-order quantities, 2^69.
pub const DYN_RANGE_SCALE: f64 = 590_295_810_358_705_651_712.0;

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;

/// Errors that can abort a batch run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("waveform generation failed for injection {id} at sensor {sensor}: {source}")]
    Waveform {
        id: u64,
        sensor: String,
        source: WaveformError,
    },

    #[error(transparent)]
    SpectrumLoad(#[from] SpectrumLoadError),

    #[error("worker pool construction failed: {0}")]
    Pool(String),
}
