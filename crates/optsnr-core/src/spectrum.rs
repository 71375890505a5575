//! One-sided noise power spectral densities
//!
//! A [`Spectrum`] is an ordered sequence of real, non-negative PSD magnitudes
//! indexed by frequency bin, annotated with its bin spacing and a
//! low-frequency cutoff. Bins below the cutoff hold [`MASKED_BIN`]
//! (`f64::INFINITY`), which the sigma statistic treats as zero weight.
//!
//! Spectra arriving from an archive rarely match the analysis configuration:
//! [`Spectrum::conform`] resamples to the target bin spacing, truncates or
//! sentinel-pads to the target length, and tightens the cutoff mask. Conforming
//! an already-correct spectrum returns it bit-for-bit unchanged.

use serde::{Deserialize, Serialize};

use crate::types::DYN_RANGE_SCALE;

/// Sentinel magnitude for bins excluded from the statistic.
pub const MASKED_BIN: f64 = f64::INFINITY;

/// Target shape a spectrum must match before use in the statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumShape {
    /// Number of one-sided frequency bins.
    pub length: usize,
    /// Bin spacing in Hz.
    pub delta_f: f64,
    /// Requested low-frequency cutoff in Hz.
    pub low_frequency_cutoff: f64,
}

impl SpectrumShape {
    /// Shape implied by an analysis segment: `length = N/2 + 1` bins spaced
    /// at `1 / segment_length` Hz, where `N = segment_length * sample_rate`.
    pub fn from_analysis(segment_length: f64, sample_rate: f64, low_frequency_cutoff: f64) -> Self {
        let n = (segment_length * sample_rate).round() as usize;
        Self {
            length: n / 2 + 1,
            delta_f: 1.0 / segment_length,
            low_frequency_cutoff,
        }
    }
}

/// A one-sided noise PSD, stored with the dynamic-range scale squared
/// already applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    values: Vec<f64>,
    delta_f: f64,
    low_frequency_cutoff: f64,
}

impl Spectrum {
    /// Wrap already-scaled PSD values. Bins below the cutoff are masked.
    pub fn new(values: Vec<f64>, delta_f: f64, low_frequency_cutoff: f64) -> Self {
        let mut spectrum = Self {
            values,
            delta_f,
            low_frequency_cutoff,
        };
        spectrum.mask_below(low_frequency_cutoff);
        spectrum
    }

    /// Build from raw archive samples in physical units: applies the
    /// dynamic-range scale (squared) and masks bins below the archive's own
    /// validated cutoff. Applied once per distinct load.
    pub fn from_raw(values: Vec<f64>, delta_f: f64, native_cutoff: f64) -> Self {
        let scaled = values
            .into_iter()
            .map(|v| v * DYN_RANGE_SCALE * DYN_RANGE_SCALE)
            .collect();
        Self::new(scaled, delta_f, native_cutoff)
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn delta_f(&self) -> f64 {
        self.delta_f
    }

    pub fn low_frequency_cutoff(&self) -> f64 {
        self.low_frequency_cutoff
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether bin `k` is excluded from the statistic.
    pub fn is_masked(&self, k: usize) -> bool {
        !self.values[k].is_finite()
    }

    /// Bring this spectrum to the target shape. Resamples when the bin
    /// spacing differs, truncates or sentinel-pads when the length differs,
    /// and masks below the stricter of the two cutoffs. Idempotent: a
    /// spectrum already matching the shape is returned unchanged.
    pub fn conform(&self, shape: &SpectrumShape) -> Spectrum {
        let mut out = if self.delta_f != shape.delta_f {
            self.resampled(shape.delta_f, shape.length)
        } else {
            self.clone()
        };

        if out.values.len() > shape.length {
            out.values.truncate(shape.length);
        } else if out.values.len() < shape.length {
            out.values.resize(shape.length, MASKED_BIN);
        }

        // Never unmask below the data's own validated cutoff.
        let effective = shape.low_frequency_cutoff.max(out.low_frequency_cutoff);
        out.mask_below(effective);
        out.low_frequency_cutoff = effective;
        out
    }

    /// Linear interpolation onto a grid of `length` bins spaced `delta_f`.
    fn resampled(&self, delta_f: f64, length: usize) -> Spectrum {
        let values = (0..length)
            .map(|k| {
                let position = k as f64 * delta_f / self.delta_f;
                let i = position.floor() as usize;
                let frac = position - i as f64;
                if i >= self.values.len() {
                    return MASKED_BIN;
                }
                if frac == 0.0 {
                    return self.values[i];
                }
                if i + 1 >= self.values.len() {
                    return MASKED_BIN;
                }
                let (lo, hi) = (self.values[i], self.values[i + 1]);
                // A masked neighbour poisons the interpolated bin.
                if !lo.is_finite() || !hi.is_finite() {
                    return MASKED_BIN;
                }
                lo * (1.0 - frac) + hi * frac
            })
            .collect();

        Spectrum {
            values,
            delta_f,
            low_frequency_cutoff: self.low_frequency_cutoff,
        }
    }

    fn mask_below(&mut self, cutoff: f64) {
        for (k, v) in self.values.iter_mut().enumerate() {
            if (k as f64) * self.delta_f < cutoff {
                *v = MASKED_BIN;
            }
        }
    }
}
