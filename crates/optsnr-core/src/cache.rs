//! Per-worker spectrum memoization
//!
//! Loading and conforming an archived spectrum is expensive; consecutive
//! injections handled by one worker usually fall inside the same validity
//! window. [`SpectrumCache`] wraps a [`SpectrumProvider`] with a single
//! `(window, spectrum)` slot: a repeated window is a hit, a different window
//! replaces the slot. One active spectrum per worker is the expected access
//! pattern, so nothing fancier than single-slot replacement is needed.
//!
//! A cache belongs to exactly one worker. Workers never share slots: each
//! builds its own cache when the pool starts and owns it until the batch
//! ends.

use std::sync::Arc;
use tracing::{debug, trace};

use crate::provider::{SpectrumLoadError, SpectrumProvider};
use crate::spectrum::Spectrum;
use crate::types::GpsSeconds;

/// Single-slot memoization of one provider's most recent load.
#[derive(Debug)]
pub struct SpectrumCache {
    provider: SpectrumProvider,
    slot: Option<(usize, Arc<Spectrum>)>,
}

impl SpectrumCache {
    pub fn new(provider: SpectrumProvider) -> Self {
        Self {
            provider,
            slot: None,
        }
    }

    /// The spectrum applying at `time`, reusing the cached load when the
    /// query resolves to the same window. `Ok(None)` means no spectrum
    /// covers the time.
    pub fn query(&mut self, time: GpsSeconds) -> Result<Option<Arc<Spectrum>>, SpectrumLoadError> {
        let Some(window) = self.provider.select(time) else {
            return Ok(None);
        };

        if let Some((cached, spectrum)) = &self.slot {
            if *cached == window {
                trace!(window, "spectrum cache hit");
                return Ok(Some(spectrum.clone()));
            }
        }

        debug!(window, "spectrum cache miss");
        let spectrum = self.provider.load_window(window)?;
        self.slot = Some((window, spectrum.clone()));
        Ok(Some(spectrum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{RawSpectrum, SpectrumIndex, SpectrumSource, ValidityWindow};
    use crate::spectrum::SpectrumShape;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        loads: AtomicUsize,
    }

    impl SpectrumSource for CountingSource {
        fn load(&self, index: usize) -> Result<RawSpectrum, SpectrumLoadError> {
            self.loads.fetch_add(1, Ordering::Relaxed);
            Ok(RawSpectrum {
                values: vec![1.0 + index as f64; 8],
                delta_f: 1.0,
            })
        }
    }

    fn bank() -> (Arc<CountingSource>, SpectrumCache) {
        let source = Arc::new(CountingSource {
            loads: AtomicUsize::new(0),
        });
        let index = SpectrumIndex::new(
            vec![
                ValidityWindow::new(0.0, 100.0),
                ValidityWindow::new(100.0, 200.0),
            ],
            2.0,
        );
        let shape = SpectrumShape {
            length: 8,
            delta_f: 1.0,
            low_frequency_cutoff: 2.0,
        };
        let cache = SpectrumCache::new(SpectrumProvider::time_indexed(
            index,
            source.clone(),
            shape,
        ));
        (source, cache)
    }

    #[test]
    fn test_repeated_queries_hit_cache() {
        let (source, mut cache) = bank();
        let first = cache.query(10.0).unwrap().unwrap();
        let second = cache.query(90.0).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.loads.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_window_change_replaces_slot() {
        let (source, mut cache) = bank();
        cache.query(10.0).unwrap().unwrap();
        cache.query(150.0).unwrap().unwrap();
        assert_eq!(source.loads.load(Ordering::Relaxed), 2);
        // Coming back to the first window is a fresh load: one slot only.
        cache.query(10.0).unwrap().unwrap();
        assert_eq!(source.loads.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_uncovered_time_is_none_and_keeps_slot() {
        let (source, mut cache) = bank();
        cache.query(10.0).unwrap().unwrap();
        assert!(cache.query(1000.0).unwrap().is_none());
        // The miss on an uncovered time must not evict the cached window.
        cache.query(20.0).unwrap().unwrap();
        assert_eq!(source.loads.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_constant_provider_passes_through() {
        let shape = SpectrumShape {
            length: 8,
            delta_f: 1.0,
            low_frequency_cutoff: 2.0,
        };
        let provider =
            SpectrumProvider::constant(Spectrum::new(vec![4.0; 8], 1.0, 2.0), &shape);
        let mut cache = SpectrumCache::new(provider);
        let a = cache.query(0.0).unwrap().unwrap();
        let b = cache.query(5e8).unwrap().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
