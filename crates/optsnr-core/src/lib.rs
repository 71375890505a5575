//! # Batch Optimal-SNR Core
//!
//! This crate computes the expected optimal matched-filter SNR ("sigma") of a
//! large batch of simulated signal injections against per-sensor noise power
//! spectral densities, which may be constant or vary over time.
//!
//! ## Pipeline
//!
//! ```text
//! injections ──► shuffle (fixed seed) ──► worker pool
//!                                            │  per worker:
//!                                            │    SpectrumCache ◄── SpectrumProvider
//!                                            │    StatisticEngine ◄─ WaveformGenerator
//!                                            ▼
//!                                     rows ──► sort by time ──► OutputTable
//! ```
//!
//! Each worker owns its own spectrum cache and planned FFT; the only shared
//! state is the read-only spectrum archive behind an `Arc`. The final table
//! order is a deterministic sort by reference time, never the pool's
//! completion order.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//! use optsnr_core::prelude::*;
//!
//! let mut config = BatchConfig {
//!     low_frequency_cutoff: 2.0,
//!     segment_length: 32.0,
//!     sample_rate: 256.0,
//!     worker_count: 2,
//!     ..BatchConfig::default()
//! };
//! config.sensor_output_columns.insert("h1".into(), "snr_h1".into());
//!
//! let shape = config.spectrum_shape();
//! let mut providers = BTreeMap::new();
//! providers.insert(
//!     "h1".to_string(),
//!     SpectrumProvider::constant(
//!         Spectrum::from_raw(vec![3.0e-46; shape.length], shape.delta_f, 0.0),
//!         &shape,
//!     ),
//! );
//!
//! let injections = vec![
//!     InjectionRecord::new(1, 1_000_000.0)
//!         .with_param("frequency", 50.0)
//!         .with_param("quality", 20.0)
//!         .with_param("amplitude", 1e-21),
//! ];
//!
//! let orchestrator =
//!     BatchOrchestrator::new(config, providers, Arc::new(RingdownGenerator::new()));
//! let table = orchestrator.run(&injections).unwrap();
//! assert!(table.rows()[0].column("snr_h1").unwrap() > 0.0);
//! ```

pub mod cache;
pub mod config;
pub mod engine;
pub mod fft;
pub mod injection;
pub mod orchestrator;
pub mod provider;
pub mod spectrum;
pub mod types;
pub mod waveform;

// Re-export main types
pub use cache::SpectrumCache;
pub use config::{BatchConfig, ConfigError};
pub use engine::{sigma, StatisticEngine, TRAILING_PADDING};
pub use injection::{InjectionRecord, OutputRow, OutputTable, SensorOutcome};
pub use provider::{
    RawSpectrum, SpectrumIndex, SpectrumLoadError, SpectrumProvider, SpectrumSource,
    ValidityWindow,
};
pub use spectrum::{Spectrum, SpectrumShape, MASKED_BIN};
pub use types::{BatchError, BatchResult, GpsSeconds, Sample, DYN_RANGE_SCALE};
pub use waveform::{RingdownGenerator, WaveformError, WaveformGenerator};
pub use orchestrator::BatchOrchestrator;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::BatchConfig;
    pub use crate::injection::{InjectionRecord, OutputTable, SensorOutcome};
    pub use crate::orchestrator::BatchOrchestrator;
    pub use crate::provider::{SpectrumIndex, SpectrumProvider, SpectrumSource, ValidityWindow};
    pub use crate::spectrum::{Spectrum, SpectrumShape};
    pub use crate::waveform::{RingdownGenerator, WaveformGenerator};
}
