//! Zero-Phase Butterworth Band-Pass Filtering
//!
//! Designs an IIR Butterworth band-pass (analog prototype, low-pass to
//! band-pass transform, pre-warped bilinear transform), factors it into
//! second-order sections and applies the cascade forward and backward so the
//! output carries no phase shift. Only the energy of the output is used
//! downstream.

use crate::error::ExtractionError;
use crate::statistics::mean;
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;
use tracing::trace;

/// Frequency band edges (Hz)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBand {
    pub low: f64,
    pub high: f64,
}

/// Physiological tremor band (3-8 Hz)
pub const TREMOR_BAND: FrequencyBand = FrequencyBand { low: 3.0, high: 8.0 };

/// Butterworth prototype order used for tremor energy
pub const TREMOR_FILTER_ORDER: usize = 4;

/// Poles closer than this to the real axis are treated as real
const REAL_POLE_TOLERANCE: f64 = 1e-12;

/// One second-order section, `b(z) / a(z)` with `a[0] == 1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 3],
}

impl Biquad {
    /// Complex response at normalized angular frequency `w` (rad/sample)
    pub fn response(&self, w: f64) -> Complex64 {
        let eval = |c: &[f64; 3]| {
            c.iter()
                .enumerate()
                .fold(Complex64::new(0.0, 0.0), |acc, (k, &v)| {
                    acc + Complex64::from_polar(v, -w * k as f64)
                })
        };
        eval(&self.b) / eval(&self.a)
    }

    fn dc_gain(&self) -> f64 {
        self.b.iter().sum::<f64>() / self.a.iter().sum::<f64>()
    }

    /// Step-response steady state of the transposed direct form II state
    fn steady_state(&self) -> [f64; 2] {
        let [b0, b1, b2] = self.b;
        let [_, a1, a2] = self.a;
        let r0 = b1 - a1 * b0;
        let r1 = b2 - a2 * b0;
        let z0 = (r0 + r1) / (1.0 + a1 + a2);
        [z0, r1 - a2 * z0]
    }

    fn step(&self, x: f64, z: &mut [f64; 2]) -> f64 {
        let y = self.b[0] * x + z[0];
        z[0] = self.b[1] * x + z[1] - self.a[1] * y;
        z[1] = self.b[2] * x - self.a[2] * y;
        y
    }
}

/// Digital band-pass filter as a cascade of second-order sections
#[derive(Debug, Clone)]
pub struct BandPassFilter {
    sections: Vec<Biquad>,
}

impl BandPassFilter {
    /// Design a Butterworth band-pass of the given prototype order.
    ///
    /// The resulting filter has order `2 * order`, split into `order`
    /// sections. Fails when the upper band edge is not below the Nyquist
    /// frequency.
    pub fn butterworth(order: usize, band: FrequencyBand, fs: f64) -> Result<Self, ExtractionError> {
        debug_assert!(order > 0 && band.low > 0.0 && band.low < band.high);

        if !fs.is_finite() || band.high >= fs / 2.0 {
            return Err(ExtractionError::SamplingRateTooLow { fs, high_hz: band.high });
        }

        // Design in the normalized fs = 2 domain
        const DESIGN_FS2: f64 = 4.0;
        let warp = |f: f64| DESIGN_FS2 * (PI * f / fs).tan();
        let w_low = warp(band.low);
        let w_high = warp(band.high);
        let bandwidth = w_high - w_low;
        let center = (w_low * w_high).sqrt();

        // Analog Butterworth prototype poles on the left half of the unit circle
        let n = order as f64;
        let prototype: Vec<Complex64> = (0..order)
            .map(|k| {
                let m = -n + 1.0 + 2.0 * k as f64;
                -Complex64::from_polar(1.0, PI * m / (2.0 * n))
            })
            .collect();

        // Low-pass to band-pass: each prototype pole splits into two
        let center_sq = Complex64::new(center * center, 0.0);
        let mut analog_poles = Vec::with_capacity(2 * order);
        for p in &prototype {
            let p_lp = *p * (bandwidth / 2.0);
            let root = (p_lp * p_lp - center_sq).sqrt();
            analog_poles.push(p_lp + root);
            analog_poles.push(p_lp - root);
        }
        let analog_gain = bandwidth.powi(order as i32);

        // Bilinear transform. The `order` analog zeros at the origin land on
        // z = 1 and the zeros at infinity on z = -1, so every section gets the
        // numerator (1 - z^-2).
        let fs2 = Complex64::new(DESIGN_FS2, 0.0);
        let poles: Vec<Complex64> = analog_poles.iter().map(|p| (fs2 + p) / (fs2 - p)).collect();
        let denom = analog_poles
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, p| acc * (fs2 - p));
        let gain = analog_gain * (Complex64::new(DESIGN_FS2.powi(order as i32), 0.0) / denom).re;

        let mut sections: Vec<Biquad> = pair_poles(&poles)
            .into_iter()
            .map(|a| Biquad { b: [1.0, 0.0, -1.0], a })
            .collect();
        debug_assert_eq!(sections.len(), order);
        if let Some(first) = sections.first_mut() {
            first.b.iter_mut().for_each(|c| *c *= gain);
        }

        trace!(fs, ?sections, "Designed band-pass filter");
        Ok(Self { sections })
    }

    /// Second-order sections in application order
    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Magnitude response at `freq` for sampling rate `fs`
    pub fn gain_at(&self, freq: f64, fs: f64) -> f64 {
        let w = 2.0 * PI * freq / fs;
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(w))
            .norm()
    }

    /// Zero-phase forward-backward filtering with odd-extension padding.
    ///
    /// Pads `3 * (2 * sections + 1)` samples on each side, shortened to
    /// `len - 1` for short signals.
    pub fn filtfilt(&self, signal: &[f64]) -> Vec<f64> {
        if signal.is_empty() {
            return Vec::new();
        }

        let len = signal.len();
        let pad = (3 * (2 * self.sections.len() + 1)).min(len - 1);
        let zi = self.steady_state();

        let first = signal[0];
        let last = signal[len - 1];
        let mut extended = Vec::with_capacity(len + 2 * pad);
        for i in (1..=pad).rev() {
            extended.push(2.0 * first - signal[i]);
        }
        extended.extend_from_slice(signal);
        for i in 1..=pad {
            extended.push(2.0 * last - signal[len - 1 - i]);
        }

        let x0 = extended[0];
        let forward = self.cascade(&extended, &zi, x0);

        let mut reversed: Vec<f64> = forward.into_iter().rev().collect();
        let y0 = reversed[0];
        reversed = self.cascade(&reversed, &zi, y0);
        reversed.reverse();

        reversed[pad..pad + len].to_vec()
    }

    /// Sum of squares of the zero-phase filtered, de-meaned signal
    pub fn energy(&self, signal: &[f64]) -> f64 {
        let m = mean(signal);
        let centered: Vec<f64> = signal.iter().map(|v| v - m).collect();
        self.filtfilt(&centered).iter().map(|v| v * v).sum()
    }

    /// Run every section over `x`, each starting from `zi * x0`
    fn cascade(&self, x: &[f64], zi: &[[f64; 2]], x0: f64) -> Vec<f64> {
        let mut y = x.to_vec();
        for (section, state) in self.sections.iter().zip(zi) {
            let mut z = [state[0] * x0, state[1] * x0];
            y.iter_mut().for_each(|v| *v = section.step(*v, &mut z));
        }
        y
    }

    /// Per-section initial states for a unit step at the cascade input
    fn steady_state(&self) -> Vec<[f64; 2]> {
        let mut scale = 1.0;
        self.sections
            .iter()
            .map(|s| {
                let [z0, z1] = s.steady_state();
                let zi = [z0 * scale, z1 * scale];
                scale *= s.dc_gain();
                zi
            })
            .collect()
    }
}

/// Tremor-band energy of a signal sampled at `fs`
pub fn tremor_energy(signal: &[f64], fs: f64) -> Result<f64, ExtractionError> {
    let filter = BandPassFilter::butterworth(TREMOR_FILTER_ORDER, TREMOR_BAND, fs)?;
    Ok(filter.energy(signal))
}

/// Denominators `[1, a1, a2]` from conjugate pole pairs, then from real
/// poles taken two at a time
fn pair_poles(poles: &[Complex64]) -> Vec<[f64; 3]> {
    let mut denominators: Vec<[f64; 3]> = poles
        .iter()
        .filter(|p| p.im > REAL_POLE_TOLERANCE)
        .map(|p| [1.0, -2.0 * p.re, p.norm_sqr()])
        .collect();

    let real: Vec<f64> = poles
        .iter()
        .filter(|p| p.im.abs() <= REAL_POLE_TOLERANCE)
        .map(|p| p.re)
        .collect();
    for pair in real.chunks(2) {
        denominators.push(match *pair {
            [p, q] => [1.0, -(p + q), p * q],
            _ => [1.0, -pair[0], 0.0],
        });
    }
    denominators
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sine(freq: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * freq * i as f64 / fs).sin()).collect()
    }

    #[test]
    fn test_design_shape() {
        let filter = BandPassFilter::butterworth(4, TREMOR_BAND, 100.0).unwrap();
        let sections = filter.sections();
        assert_eq!(sections.len(), 4);
        for s in sections {
            assert_eq!(s.a[0], 1.0);
            // Numerator zeros sit at z = 1 and z = -1
            assert_eq!(s.b[1], 0.0);
            assert_eq!(s.b[2], -s.b[0]);
            // Stable: both poles inside the unit circle
            assert!(s.a[2] > 0.0 && s.a[2] < 1.0);
        }
    }

    #[test]
    fn test_band_edges_are_half_power() {
        let fs = 100.0;
        let filter = BandPassFilter::butterworth(4, TREMOR_BAND, fs).unwrap();
        let half_power = std::f64::consts::FRAC_1_SQRT_2;
        assert!((filter.gain_at(3.0, fs) - half_power).abs() < 1e-6);
        assert!((filter.gain_at(8.0, fs) - half_power).abs() < 1e-6);
        assert!(filter.gain_at(0.0, fs) < 1e-9);
        assert!(filter.gain_at(25.0, fs) < 0.01);
    }

    #[test]
    fn test_passband_peak_is_unity() {
        let fs = 60.0;
        let filter = BandPassFilter::butterworth(4, TREMOR_BAND, fs).unwrap();
        let warp = |f: f64| (PI * f / fs).tan();
        let center = fs / PI * (warp(3.0) * warp(8.0)).sqrt().atan();
        assert!((filter.gain_at(center, fs) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_nyquist_rejected() {
        let err = BandPassFilter::butterworth(4, TREMOR_BAND, 16.0).unwrap_err();
        assert!(matches!(err, ExtractionError::SamplingRateTooLow { .. }));
        assert!(tremor_energy(&[0.0, 1.0, 0.0], f64::INFINITY).is_err());
    }

    #[test]
    fn test_tremor_band_passes_energy() {
        let fs = 100.0;
        let in_band = sine(5.0, fs, 2000);
        let raw: f64 = in_band.iter().map(|v| v * v).sum();
        let energy = tremor_energy(&in_band, fs).unwrap();
        assert!((energy / raw - 1.0).abs() < 0.05, "ratio {}", energy / raw);

        let out_of_band = sine(30.0, fs, 2000);
        let energy = tremor_energy(&out_of_band, fs).unwrap();
        assert!(energy / raw < 0.01);
    }

    #[test]
    fn test_high_sampling_rate_stays_stable() {
        // Millisecond timestamp ties can push the estimate to 2 kHz
        for fs in [1000.0, 2000.0, 4000.0] {
            let n = (fs * 10.0) as usize;
            let in_band = sine(5.0, fs, n);
            let raw: f64 = in_band.iter().map(|v| v * v).sum();
            let energy = tremor_energy(&in_band, fs).unwrap();
            assert!((energy / raw - 1.0).abs() < 0.05, "fs {} ratio {}", fs, energy / raw);

            let filter = BandPassFilter::butterworth(4, TREMOR_BAND, fs).unwrap();
            let half_power = std::f64::consts::FRAC_1_SQRT_2;
            assert!((filter.gain_at(3.0, fs) - half_power).abs() < 1e-6);
            assert!((filter.gain_at(8.0, fs) - half_power).abs() < 1e-6);
        }
    }

    #[test]
    fn test_steady_state_cancels_step_transient() {
        // A constant input started from the scaled steady state passes through unchanged
        let filter = BandPassFilter::butterworth(4, TREMOR_BAND, 100.0).unwrap();
        let zi = filter.steady_state();
        let out = filter.cascade(&[3.0; 40], &zi, 3.0);
        assert!(out.iter().all(|v| v.abs() < 1e-9), "{:?}", out);
    }

    #[test]
    fn test_filtfilt_has_no_phase_shift() {
        let fs = 100.0;
        let signal = sine(5.0, fs, 1000);
        let filter = BandPassFilter::butterworth(4, TREMOR_BAND, fs).unwrap();
        let filtered = filter.filtfilt(&signal);
        // Away from the edges the output tracks the input sample for sample
        for i in 300..700 {
            assert!((filtered[i] - signal[i]).abs() < 0.05, "sample {}", i);
        }
    }

    #[test]
    fn test_short_signal_is_finite() {
        let filter = BandPassFilter::butterworth(4, TREMOR_BAND, 100.0).unwrap();
        let out = filter.filtfilt(&[0.0, 1.0, 2.0]);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|v| v.is_finite()));
        assert!(filter.filtfilt(&[]).is_empty());
        assert_eq!(filter.filtfilt(&[5.0]).len(), 1);
    }

    #[test]
    fn test_constant_signal_has_zero_energy() {
        let energy = tremor_energy(&[1.0; 50], 100.0).unwrap();
        assert!(energy.abs() < 1e-20);
    }

    proptest! {
        #[test]
        fn prop_energy_non_negative(signal in prop::collection::vec(-1000.0f64..1000.0, 2..200)) {
            let energy = tremor_energy(&signal, 100.0).unwrap();
            prop_assert!(energy >= 0.0);
        }

        #[test]
        fn prop_energy_scales_quadratically(
            signal in prop::collection::vec(-10.0f64..10.0, 2..200),
            k in 0.1f64..20.0,
        ) {
            let scaled: Vec<f64> = signal.iter().map(|v| v * k).collect();
            let base = tremor_energy(&signal, 100.0).unwrap();
            let energy = tremor_energy(&scaled, 100.0).unwrap();
            prop_assert!((energy - k * k * base).abs() <= 1e-9 * (1.0 + k * k * base));
        }
    }
}
