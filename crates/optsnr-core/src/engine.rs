//! The sigma statistic
//!
//! [`StatisticEngine`] turns one (injection, sensor, spectrum) triple into the
//! expected optimal matched-filter SNR:
//!
//! ```text
//! sigma^2 = 4 * delta_f * sum_k |h~(k)|^2 / S(k)
//! ```
//!
//! summed over bins at or above the low-frequency cutoff (and below the
//! optional high-frequency cutoff), where `h~` is the one-sided frequency
//! series of the injected signal and `S` the noise PSD. Masked spectrum bins
//! contribute zero weight.
//!
//! The analysis window is anchored so the signal sits inside it with a fixed
//! trailing pad for any ringdown tail: the window starts at
//! `reference_time + TRAILING_PADDING - segment_length`. Generated series are
//! scaled by the dynamic-range factor, which the PSD's squared scale cancels.
//!
//! One engine instance belongs to one worker; it owns the planned FFT reused
//! across that worker's whole share of the batch.

use std::sync::Arc;

use num_complex::Complex64;

use crate::fft::ForwardFft;
use crate::injection::InjectionRecord;
use crate::spectrum::Spectrum;
use crate::types::DYN_RANGE_SCALE;
use crate::waveform::{WaveformError, WaveformGenerator};

/// Seconds left free after the reference time inside the analysis window.
pub const TRAILING_PADDING: f64 = 16.0;

/// Per-worker sigma computation with a fixed analysis shape.
pub struct StatisticEngine {
    segment_length: f64,
    sample_rate: f64,
    low_frequency_cutoff: f64,
    high_frequency_cutoff: Option<f64>,
    generator: Arc<dyn WaveformGenerator>,
    fft: ForwardFft,
}

impl std::fmt::Debug for StatisticEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticEngine")
            .field("segment_length", &self.segment_length)
            .field("sample_rate", &self.sample_rate)
            .field("low_frequency_cutoff", &self.low_frequency_cutoff)
            .field("high_frequency_cutoff", &self.high_frequency_cutoff)
            .finish()
    }
}

impl StatisticEngine {
    pub fn new(
        segment_length: f64,
        sample_rate: f64,
        low_frequency_cutoff: f64,
        high_frequency_cutoff: Option<f64>,
        generator: Arc<dyn WaveformGenerator>,
    ) -> Self {
        let n = (segment_length * sample_rate).round() as usize;
        Self {
            segment_length,
            sample_rate,
            low_frequency_cutoff,
            high_frequency_cutoff,
            generator,
            fft: ForwardFft::new(n),
        }
    }

    /// Number of time-domain samples in the analysis window.
    pub fn segment_samples(&self) -> usize {
        self.fft.size()
    }

    /// Expected optimal SNR of `record` at `sensor` against `spectrum`.
    ///
    /// `spectrum` must already be conformed to the analysis shape. Waveform
    /// rejection is returned to the caller, which decides containment.
    pub fn compute(
        &mut self,
        record: &InjectionRecord,
        sensor: &str,
        spectrum: &Spectrum,
    ) -> Result<f64, WaveformError> {
        let start_time = record.reference_time + TRAILING_PADDING - self.segment_length;
        let mut series = self.generator.generate(
            record,
            sensor,
            start_time,
            self.segment_length,
            self.sample_rate,
        )?;
        for sample in series.iter_mut() {
            *sample *= DYN_RANGE_SCALE;
        }

        let htilde = self.fft.one_sided(&series, 1.0 / self.sample_rate);
        Ok(sigma(
            &htilde,
            spectrum,
            self.low_frequency_cutoff,
            self.high_frequency_cutoff,
        ))
    }
}

/// The inner-product statistic over a one-sided frequency series.
pub fn sigma(
    htilde: &[Complex64],
    spectrum: &Spectrum,
    low_frequency_cutoff: f64,
    high_frequency_cutoff: Option<f64>,
) -> f64 {
    assert_eq!(htilde.len(), spectrum.len());
    let delta_f = spectrum.delta_f();
    let k_min = (low_frequency_cutoff / delta_f).ceil() as usize;
    let k_max = match high_frequency_cutoff {
        Some(f_high) => ((f_high / delta_f).floor() as usize).min(htilde.len() - 1),
        None => htilde.len() - 1,
    };

    let mut sum = 0.0;
    for k in k_min..=k_max {
        if spectrum.is_masked(k) {
            continue;
        }
        sum += htilde[k].norm_sqr() / spectrum.values()[k];
    }
    (4.0 * delta_f * sum).sqrt()
}
