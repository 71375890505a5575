//! Batch orchestration
//!
//! [`BatchOrchestrator`] fans a set of injection records out over a
//! fixed-size worker pool and reassembles the results in canonical order.
//! The moving parts:
//!
//! - configuration is validated before anything is dispatched; a sensor named
//!   in the output columns without a spectrum provider (or vice versa) fails
//!   the whole run up front;
//! - processing order is a fixed-seed shuffle of the input, purely to spread
//!   expensive records across workers when cost correlates with file
//!   position;
//! - each worker builds its own state once (spectrum caches plus a planned
//!   statistic engine) and owns it for its whole share of the batch;
//! - the pool's completion order is meaningless; the output table is sorted
//!   by reference time as the single source of row ordering.
//!
//! In permissive mode a waveform failure marks that one (record, sensor)
//! outcome and processing continues; in strict mode it aborts the run and no
//! table is produced.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::SpectrumCache;
use crate::config::{BatchConfig, ConfigError};
use crate::engine::StatisticEngine;
use crate::injection::{InjectionRecord, OutputRow, OutputTable, SensorOutcome};
use crate::provider::SpectrumProvider;
use crate::types::{BatchError, BatchResult};
use crate::waveform::WaveformGenerator;

/// Seed of the load-balancing shuffle; fixed so repeated runs with the same
/// inputs and worker count are deterministic.
const SHUFFLE_SEED: u64 = 0x5EED;

/// Distributes per-injection sigma computation across a worker pool.
pub struct BatchOrchestrator {
    config: BatchConfig,
    providers: BTreeMap<String, SpectrumProvider>,
    generator: Arc<dyn WaveformGenerator>,
}

impl BatchOrchestrator {
    pub fn new(
        config: BatchConfig,
        providers: BTreeMap<String, SpectrumProvider>,
        generator: Arc<dyn WaveformGenerator>,
    ) -> Self {
        Self {
            config,
            providers,
            generator,
        }
    }

    /// Process every record and return the time-ordered output table.
    ///
    /// Fails fast on inconsistent configuration. In strict mode the first
    /// waveform failure aborts with no table; spectrum archive failures abort
    /// in either mode.
    pub fn run(&self, injections: &[InjectionRecord]) -> BatchResult<OutputTable> {
        self.validate()?;

        let mut order: Vec<usize> = (0..injections.len()).collect();
        order.shuffle(&mut rand::rngs::StdRng::seed_from_u64(SHUFFLE_SEED));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.worker_count)
            .build()
            .map_err(|e| BatchError::Pool(e.to_string()))?;

        info!(
            records = injections.len(),
            sensors = self.providers.len(),
            workers = self.config.worker_count,
            "starting batch"
        );

        let rows: Vec<BatchResult<OutputRow>> = pool.install(|| {
            order
                .par_iter()
                .map_init(
                    || WorkerState::new(&self.config, &self.providers, self.generator.clone()),
                    |worker, &i| worker.process(&injections[i]),
                )
                .collect()
        });

        let rows: Vec<OutputRow> = rows.into_iter().collect::<BatchResult<_>>()?;
        info!(rows = rows.len(), "batch complete");
        Ok(OutputTable::from_rows(rows))
    }

    /// Requested output columns and supplied spectra must cover the same
    /// sensors.
    fn validate(&self) -> Result<(), ConfigError> {
        self.config.validate()?;

        let missing: Vec<&String> = self
            .config
            .sensor_output_columns
            .keys()
            .filter(|sensor| !self.providers.contains_key(*sensor))
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "no spectrum provider for sensors {missing:?}"
            )));
        }

        let unused: Vec<&String> = self
            .providers
            .keys()
            .filter(|sensor| !self.config.sensor_output_columns.contains_key(*sensor))
            .collect();
        if !unused.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "spectrum providers for sensors {unused:?} have no output column"
            )));
        }
        Ok(())
    }
}

/// Everything one worker owns: its spectrum caches and its planned engine.
struct WorkerState {
    caches: BTreeMap<String, SpectrumCache>,
    engine: StatisticEngine,
    columns: BTreeMap<String, String>,
    permissive: bool,
}

impl WorkerState {
    fn new(
        config: &BatchConfig,
        providers: &BTreeMap<String, SpectrumProvider>,
        generator: Arc<dyn WaveformGenerator>,
    ) -> Self {
        let caches = providers
            .iter()
            .map(|(sensor, provider)| (sensor.clone(), SpectrumCache::new(provider.clone())))
            .collect();
        Self {
            caches,
            engine: StatisticEngine::new(
                config.segment_length,
                config.sample_rate,
                config.low_frequency_cutoff,
                config.high_frequency_cutoff,
                generator,
            ),
            columns: config.sensor_output_columns.clone(),
            permissive: config.permissive_waveform_errors,
        }
    }

    /// One record, all sensors in fixed (sorted) order.
    fn process(&mut self, record: &InjectionRecord) -> BatchResult<OutputRow> {
        let mut outcomes = BTreeMap::new();
        for (sensor, cache) in self.caches.iter_mut() {
            // Validation pinned the cache and column key sets to each other.
            let Some(column) = self.columns.get(sensor) else {
                continue;
            };

            let spectrum = match cache.query(record.reference_time)? {
                Some(spectrum) => spectrum,
                None => {
                    debug!(
                        id = record.id,
                        sensor = %sensor,
                        "no spectrum covers injection time"
                    );
                    outcomes.insert(column.clone(), SensorOutcome::NoSpectrum);
                    continue;
                }
            };

            match self.engine.compute(record, sensor, &spectrum) {
                Ok(sigma) => {
                    outcomes.insert(column.clone(), SensorOutcome::Computed(sigma));
                }
                Err(source) if self.permissive => {
                    warn!(
                        id = record.id,
                        sensor = %sensor,
                        error = %source,
                        "waveform generation failed"
                    );
                    outcomes.insert(column.clone(), SensorOutcome::WaveformFailed);
                }
                Err(source) => {
                    return Err(BatchError::Waveform {
                        id: record.id,
                        sensor: sensor.clone(),
                        source,
                    });
                }
            }
        }
        Ok(OutputRow {
            record: record.clone(),
            outcomes,
        })
    }
}
