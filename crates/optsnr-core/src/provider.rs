//! Spectrum providers: constant and time-indexed
//!
//! A [`SpectrumProvider`] answers one question: which noise spectrum applies
//! at a given GPS time? The constant variant always returns the same
//! pre-conformed spectrum. The time-indexed variant consults a
//! [`SpectrumIndex`] of validity windows, lazily loads the matching spectrum
//! through an opaque [`SpectrumSource`], and conforms it to the analysis
//! shape. A time with no covering window is not an error: the query yields
//! `Ok(None)` and the caller skips that sensor.
//!
//! The two variants are a tagged enum behind one `query` method; which one a
//! sensor uses is decided at configuration time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::spectrum::{Spectrum, SpectrumShape};
use crate::types::GpsSeconds;

/// Raw PSD samples as stored in an archive, in physical units.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSpectrum {
    pub values: Vec<f64>,
    pub delta_f: f64,
}

/// Failure to pull a spectrum out of the archive.
#[derive(Debug, Clone, thiserror::Error)]
#[error("spectrum {index} could not be loaded: {reason}")]
pub struct SpectrumLoadError {
    pub index: usize,
    pub reason: String,
}

/// Opaque archive collaborator: loads raw spectrum samples by index position
/// in the [`SpectrumIndex`]. Implementations must be safe to share across
/// workers (the archive is read-only during a batch).
pub trait SpectrumSource: Send + Sync {
    fn load(&self, index: usize) -> Result<RawSpectrum, SpectrumLoadError>;
}

/// Half-open validity interval `[start, end)` of one archived spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidityWindow {
    pub start: GpsSeconds,
    pub end: GpsSeconds,
}

impl ValidityWindow {
    pub fn new(start: GpsSeconds, end: GpsSeconds) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: GpsSeconds) -> bool {
        self.start <= time && time < self.end
    }

    pub fn center(&self) -> GpsSeconds {
        0.5 * (self.start + self.end)
    }
}

/// Per-sensor table of validity windows, ordered as the archive lists them
/// (ascending start time), plus the archive's own validated low-frequency
/// cutoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumIndex {
    windows: Vec<ValidityWindow>,
    native_low_frequency_cutoff: f64,
}

impl SpectrumIndex {
    pub fn new(windows: Vec<ValidityWindow>, native_low_frequency_cutoff: f64) -> Self {
        Self {
            windows,
            native_low_frequency_cutoff,
        }
    }

    pub fn windows(&self) -> &[ValidityWindow] {
        &self.windows
    }

    pub fn native_low_frequency_cutoff(&self) -> f64 {
        self.native_low_frequency_cutoff
    }

    /// Index of the window covering `time`. With several overlapping
    /// candidates the one whose center lies closest wins; an exact tie keeps
    /// the first in index order.
    pub fn select(&self, time: GpsSeconds) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, window) in self.windows.iter().enumerate() {
            if !window.contains(time) {
                continue;
            }
            let distance = (window.center() - time).abs();
            match best {
                Some((_, closest)) if distance >= closest => {}
                _ => best = Some((i, distance)),
            }
        }
        best.map(|(i, _)| i)
    }
}

/// Which spectrum applies at a given time, decided at configuration time.
#[derive(Clone)]
pub enum SpectrumProvider {
    /// One spectrum for all time, conformed at construction.
    Constant(Arc<Spectrum>),
    /// A bank of spectra with validity windows, loaded lazily.
    TimeIndexed {
        index: SpectrumIndex,
        source: Arc<dyn SpectrumSource>,
        shape: SpectrumShape,
    },
}

impl fmt::Debug for SpectrumProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpectrumProvider::Constant(s) => f
                .debug_struct("Constant")
                .field("bins", &s.len())
                .finish(),
            SpectrumProvider::TimeIndexed { index, shape, .. } => f
                .debug_struct("TimeIndexed")
                .field("windows", &index.windows().len())
                .field("shape", shape)
                .finish(),
        }
    }
}

impl SpectrumProvider {
    /// Constant provider: the spectrum is conformed once, up front.
    pub fn constant(spectrum: Spectrum, shape: &SpectrumShape) -> Self {
        SpectrumProvider::Constant(Arc::new(spectrum.conform(shape)))
    }

    /// Time-indexed provider over an archive source.
    pub fn time_indexed(
        index: SpectrumIndex,
        source: Arc<dyn SpectrumSource>,
        shape: SpectrumShape,
    ) -> Self {
        SpectrumProvider::TimeIndexed {
            index,
            source,
            shape,
        }
    }

    /// Resolve the window index for a query time without loading anything.
    /// Constant providers are valid for all time and report window 0.
    pub fn select(&self, time: GpsSeconds) -> Option<usize> {
        match self {
            SpectrumProvider::Constant(_) => Some(0),
            SpectrumProvider::TimeIndexed { index, .. } => index.select(time),
        }
    }

    /// Load and conform the spectrum for a previously selected window.
    pub fn load_window(&self, window: usize) -> Result<Arc<Spectrum>, SpectrumLoadError> {
        match self {
            SpectrumProvider::Constant(spectrum) => Ok(spectrum.clone()),
            SpectrumProvider::TimeIndexed {
                index,
                source,
                shape,
            } => {
                let raw = source.load(window)?;
                debug!(
                    window,
                    bins = raw.values.len(),
                    delta_f = raw.delta_f,
                    "loading spectrum"
                );
                let spectrum =
                    Spectrum::from_raw(raw.values, raw.delta_f, index.native_low_frequency_cutoff())
                        .conform(shape);
                Ok(Arc::new(spectrum))
            }
        }
    }

    /// One-shot query: select, then load. `Ok(None)` means no spectrum covers
    /// the query time. Workers go through [`crate::cache::SpectrumCache`]
    /// instead, which memoizes the load.
    pub fn query(&self, time: GpsSeconds) -> Result<Option<Arc<Spectrum>>, SpectrumLoadError> {
        match self.select(time) {
            None => Ok(None),
            Some(window) => self.load_window(window).map(Some),
        }
    }
}
