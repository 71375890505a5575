//! Forward FFT for real analysis segments
//!
//! Wraps a planned `rustfft` transform with its scratch buffer, reused across
//! every injection a worker processes. The statistic only needs the one-sided
//! frequency series of a real-valued segment, scaled by the sample interval
//! so the result approximates the continuous Fourier transform in units of
//! 1/Hz.

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

use crate::types::Sample;

/// Planned forward transform of a fixed segment length.
pub struct ForwardFft {
    size: usize,
    fft: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
}

impl fmt::Debug for ForwardFft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardFft").field("size", &self.size).finish()
    }
}

impl ForwardFft {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex64::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Self { size, fft, scratch }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// One-sided frequency series of a real segment sampled at `delta_t`
    /// second intervals: `size / 2 + 1` bins, each the DFT output times
    /// `delta_t`.
    pub fn one_sided(&mut self, series: &[Sample], delta_t: f64) -> Vec<Complex64> {
        assert_eq!(series.len(), self.size);
        let mut buffer: Vec<Complex64> =
            series.iter().map(|&x| Complex64::new(x, 0.0)).collect();
        self.fft.process_with_scratch(&mut buffer, &mut self.scratch);
        buffer.truncate(self.size / 2 + 1);
        for bin in buffer.iter_mut() {
            *bin *= delta_t;
        }
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_one_sided_length() {
        let mut fft = ForwardFft::new(64);
        let spectrum = fft.one_sided(&vec![0.0; 64], 1.0);
        assert_eq!(spectrum.len(), 33);
    }

    #[test]
    fn test_tone_lands_in_its_bin() {
        let n = 128;
        let sample_rate = 128.0;
        let series: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * 10.0 * i as f64 / sample_rate).cos())
            .collect();

        let mut fft = ForwardFft::new(n);
        let spectrum = fft.one_sided(&series, 1.0 / sample_rate);

        let peak = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().partial_cmp(&b.1.norm()).unwrap())
            .unwrap()
            .0;
        assert_eq!(peak, 10);
        // A unit-amplitude cosine puts N/2 * delta_t into its bin.
        assert_relative_eq!(
            spectrum[10].norm(),
            n as f64 / 2.0 / sample_rate,
            max_relative = 1e-10
        );
    }

    #[test]
    fn test_parseval_one_sided() {
        // 2 * delta_f * sum |x~|^2 over positive bins == delta_t * sum x^2
        // for a real zero-mean series with no Nyquist content.
        let n = 256;
        let sample_rate = 256.0;
        let series: Vec<f64> = (0..n)
            .map(|i| {
                let t = i as f64 / sample_rate;
                (2.0 * PI * 20.0 * t).sin() + 0.5 * (2.0 * PI * 41.0 * t).cos()
            })
            .collect();

        let mut fft = ForwardFft::new(n);
        let delta_t = 1.0 / sample_rate;
        let spectrum = fft.one_sided(&series, delta_t);
        let delta_f = sample_rate / n as f64;

        let freq_energy: f64 = 2.0 * delta_f
            * spectrum[1..spectrum.len() - 1]
                .iter()
                .map(|x| x.norm_sqr())
                .sum::<f64>();
        let time_energy: f64 = delta_t * series.iter().map(|x| x * x).sum::<f64>();
        assert_relative_eq!(freq_energy, time_energy, max_relative = 1e-9);
    }
}
