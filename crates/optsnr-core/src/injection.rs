//! Injection records and the batch output table
//!
//! An [`InjectionRecord`] carries the immutable per-event parameters of one
//! simulated signal: when it happens, a unique identifier, and the named
//! physical parameters the waveform generator consumes. Records are never
//! mutated during processing; results are produced as [`OutputRow`]s that pair
//! the record with a per-sensor [`SensorOutcome`].
//!
//! ## Example
//!
//! ```rust
//! use optsnr_core::injection::InjectionRecord;
//!
//! let record = InjectionRecord::new(42, 1_187_008_882.4)
//!     .with_param("frequency", 250.0)
//!     .with_param("quality", 20.0)
//!     .with_param("amplitude", 1e-21);
//! assert_eq!(record.param("frequency"), Some(250.0));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::types::GpsSeconds;

/// Immutable parameters of one simulated injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectionRecord {
    /// Unique identifier, preserved verbatim into the output table.
    pub id: u64,
    /// Geocentric reference time in GPS seconds.
    pub reference_time: GpsSeconds,
    /// Named physical parameters consumed by waveform generation.
    pub params: HashMap<String, f64>,
}

impl InjectionRecord {
    pub fn new(id: u64, reference_time: GpsSeconds) -> Self {
        Self {
            id,
            reference_time,
            params: HashMap::new(),
        }
    }

    /// Add a named waveform parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Look up a named waveform parameter.
    pub fn param(&self, name: &str) -> Option<f64> {
        self.params.get(name).copied()
    }
}

/// What happened for one (record, sensor) pair.
///
/// `NoSpectrum` (no validity window covered the injection time) and
/// `WaveformFailed` (generation rejected the parameters under permissive
/// mode) both leave the numeric output column untouched; the tag keeps the
/// two conditions distinguishable downstream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SensorOutcome {
    /// The optimal SNR was computed.
    Computed(f64),
    /// No spectrum covered the injection time; the column is untouched.
    NoSpectrum,
    /// Waveform generation failed in permissive mode; the column is untouched.
    WaveformFailed,
}

impl SensorOutcome {
    /// The numeric column value: populated only when computed.
    pub fn value(&self) -> Option<f64> {
        match self {
            SensorOutcome::Computed(sigma) => Some(*sigma),
            SensorOutcome::NoSpectrum | SensorOutcome::WaveformFailed => None,
        }
    }
}

/// One finished row: the original record plus per-column outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRow {
    pub record: InjectionRecord,
    /// Outcomes keyed by output column name.
    pub outcomes: BTreeMap<String, SensorOutcome>,
}

impl OutputRow {
    /// The numeric value of an output column, `None` if the column was left
    /// untouched (no spectrum, failed generation, or never processed).
    pub fn column(&self, name: &str) -> Option<f64> {
        self.outcomes.get(name).and_then(|o| o.value())
    }

    /// The tagged outcome for an output column, if that column was processed.
    pub fn outcome(&self, name: &str) -> Option<SensorOutcome> {
        self.outcomes.get(name).copied()
    }
}

/// Final ordered result of a batch run.
///
/// Rows are sorted by reference time ascending (ties broken by id), a
/// canonical order independent of worker completion order.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    rows: Vec<OutputRow>,
}

impl OutputTable {
    /// Build a table from unordered rows, establishing the canonical order.
    pub fn from_rows(mut rows: Vec<OutputRow>) -> Self {
        rows.sort_by(|a, b| {
            a.record
                .reference_time
                .total_cmp(&b.record.reference_time)
                .then(a.record.id.cmp(&b.record.id))
        });
        Self { rows }
    }

    pub fn rows(&self) -> &[OutputRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OutputRow> {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: u64, t: GpsSeconds) -> OutputRow {
        OutputRow {
            record: InjectionRecord::new(id, t),
            outcomes: BTreeMap::new(),
        }
    }

    #[test]
    fn test_table_sorts_by_time() {
        let table = OutputTable::from_rows(vec![row(1, 300.0), row(2, 100.0), row(3, 200.0)]);
        let ids: Vec<u64> = table.iter().map(|r| r.record.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_table_ties_break_by_id() {
        let table = OutputTable::from_rows(vec![row(9, 100.0), row(4, 100.0), row(7, 100.0)]);
        let ids: Vec<u64> = table.iter().map(|r| r.record.id).collect();
        assert_eq!(ids, vec![4, 7, 9]);
    }

    #[test]
    fn test_untouched_column_is_none() {
        let mut r = row(1, 0.0);
        r.outcomes
            .insert("snr_h1".to_string(), SensorOutcome::NoSpectrum);
        assert_eq!(r.column("snr_h1"), None);
        assert_eq!(r.outcome("snr_h1"), Some(SensorOutcome::NoSpectrum));
        assert_eq!(r.column("snr_l1"), None);
        assert_eq!(r.outcome("snr_l1"), None);
    }

    #[test]
    fn test_computed_column_value() {
        let mut r = row(1, 0.0);
        r.outcomes
            .insert("snr_h1".to_string(), SensorOutcome::Computed(12.5));
        assert_eq!(r.column("snr_h1"), Some(12.5));
    }
}
