//! Harmonics-to-Noise Ratio
//!
//! Per voiced analysis window, the normalized autocorrelation peak `r` in the
//! pitch lag range splits the signal into a periodic part (`r`) and noise
//! (`1 - r`). The window's own autocorrelation is divided out so that the
//! Hann taper does not bias `r` downwards.

use super::pitch::PitchTrack;
use super::VoiceConfig;
use rustfft::{num_complex::Complex, FftPlanner};

/// Bounds keeping the dB conversion finite
const MIN_CORRELATION: f64 = 1e-6;
const MAX_CORRELATION: f64 = 1.0 - 1e-6;

/// Noise measures averaged over voiced windows
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Harmonicity {
    /// Harmonics-to-noise ratio (dB)
    pub hnr: f64,
    /// Noise-to-harmonics ratio
    pub nhr: f64,
}

/// Autocorrelation analyzer for fixed-length windows
pub struct HarmonicityAnalyzer {
    /// FFT planner for efficient computation
    planner: FftPlanner<f64>,
    /// Analysis window length (samples)
    window_len: usize,
    /// Zero-padded FFT size
    fft_len: usize,
    /// Hann taper
    window: Vec<f64>,
    /// Normalized autocorrelation of the taper
    window_acf: Vec<f64>,
}

impl HarmonicityAnalyzer {
    /// Create an analyzer for windows of `window_len` samples
    pub fn new(window_len: usize) -> Self {
        let fft_len = (2 * window_len).next_power_of_two();
        let window: Vec<f64> = (0..window_len)
            .map(|i| {
                0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / window_len as f64).cos()
            })
            .collect();

        let mut analyzer = Self {
            planner: FftPlanner::new(),
            window_len,
            fft_len,
            window: Vec::new(),
            window_acf: Vec::new(),
        };
        let acf = analyzer.autocorrelation(&window);
        analyzer.window_acf = normalize(&acf).unwrap_or_default();
        analyzer.window = window;
        analyzer
    }

    /// Average HNR/NHR over the voiced frames of a track.
    ///
    /// `None` when no voiced frame carries energy.
    pub fn analyze(
        &mut self,
        samples: &[f64],
        sample_rate: u32,
        track: &PitchTrack,
        config: &VoiceConfig,
    ) -> Option<Harmonicity> {
        let fs = sample_rate as f64;
        let min_lag = (fs / config.max_pitch_hz).ceil() as usize;
        let max_lag = ((fs / config.min_pitch_hz).floor() as usize).min(self.window_len / 2);
        if min_lag == 0 || min_lag > max_lag {
            return None;
        }

        let mut hnr_sum = 0.0;
        let mut nhr_sum = 0.0;
        let mut count = 0usize;

        for (i, f0) in track.frequencies.iter().enumerate() {
            if *f0 <= 0.0 {
                continue;
            }
            let start = i * track.hop;
            let Some(frame) = samples.get(start..start + self.window_len) else {
                continue;
            };
            let Some(r) = self.peak_correlation(frame, min_lag, max_lag) else {
                continue;
            };

            let r = r.clamp(MIN_CORRELATION, MAX_CORRELATION);
            hnr_sum += 10.0 * (r / (1.0 - r)).log10();
            nhr_sum += (1.0 - r) / r;
            count += 1;
        }

        (count > 0).then(|| Harmonicity {
            hnr: hnr_sum / count as f64,
            nhr: nhr_sum / count as f64,
        })
    }

    /// Maximum window-corrected normalized autocorrelation in a lag range
    fn peak_correlation(&mut self, frame: &[f64], min_lag: usize, max_lag: usize) -> Option<f64> {
        let mean = frame.iter().sum::<f64>() / frame.len() as f64;
        let tapered: Vec<f64> = frame
            .iter()
            .zip(&self.window)
            .map(|(x, w)| (x - mean) * w)
            .collect();

        let acf = normalize(&self.autocorrelation(&tapered))?;
        (min_lag..=max_lag)
            .filter(|&lag| self.window_acf[lag] > 0.0)
            .map(|lag| acf[lag] / self.window_acf[lag])
            .max_by(|a, b| a.total_cmp(b))
    }

    /// Linear autocorrelation for lags `0..window_len` via zero-padded FFT
    fn autocorrelation(&mut self, signal: &[f64]) -> Vec<f64> {
        let mut buffer: Vec<Complex<f64>> = signal
            .iter()
            .map(|&v| Complex::new(v, 0.0))
            .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
            .take(self.fft_len)
            .collect();

        self.planner.plan_fft_forward(self.fft_len).process(&mut buffer);
        for c in buffer.iter_mut() {
            *c = Complex::new(c.norm_sqr(), 0.0);
        }
        self.planner.plan_fft_inverse(self.fft_len).process(&mut buffer);

        buffer
            .iter()
            .take(self.window_len)
            .map(|c| c.re / self.fft_len as f64)
            .collect()
    }
}

/// Divide by lag-zero energy; `None` for a silent window
fn normalize(acf: &[f64]) -> Option<Vec<f64>> {
    let energy = *acf.first()?;
    (energy > 0.0).then(|| acf.iter().map(|v| v / energy).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::pitch::track_pitch;
    use std::f64::consts::PI;

    const FS: u32 = 16_000;

    fn tone(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * 150.0 * i as f64 / FS as f64).sin() * 0.5)
            .collect()
    }

    /// Deterministic uniform noise in [-1, 1]
    fn noise(n: usize, mut state: u64) -> Vec<f64> {
        (0..n)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
            })
            .collect()
    }

    fn analyze(samples: &[f64]) -> Option<Harmonicity> {
        let config = VoiceConfig::default();
        let track = track_pitch(samples, FS, &config);
        HarmonicityAnalyzer::new(track.frame_len).analyze(samples, FS, &track, &config)
    }

    #[test]
    fn test_clean_tone_is_harmonic() {
        let h = analyze(&tone(16_000)).unwrap();
        assert!(h.hnr > 20.0, "hnr {}", h.hnr);
        assert!(h.nhr < 0.01, "nhr {}", h.nhr);
    }

    #[test]
    fn test_noise_lowers_hnr() {
        let clean = tone(16_000);
        let noisy: Vec<f64> = clean
            .iter()
            .zip(noise(16_000, 0x9E37_79B9_7F4A_7C15))
            .map(|(s, n)| s + 0.1 * n)
            .collect();

        let clean_h = analyze(&clean).unwrap();
        let noisy_h = analyze(&noisy).unwrap();
        assert!(noisy_h.hnr < clean_h.hnr);
        assert!(noisy_h.nhr > clean_h.nhr);
        assert!(noisy_h.hnr.is_finite());
    }

    #[test]
    fn test_window_autocorrelation_normalized() {
        let analyzer = HarmonicityAnalyzer::new(640);
        assert!((analyzer.window_acf[0] - 1.0).abs() < 1e-12);
        assert!(analyzer.window_acf[320] < analyzer.window_acf[10]);
    }
}
