//! Jitter and Shimmer
//!
//! Cycle-to-cycle perturbation of glottal periods (jitter) and peak
//! amplitudes (shimmer). Every measure averages over all cycle sequences;
//! differences are never taken across a sequence break.

use super::pitch::Cycle;

/// Period perturbation measures
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Jitter {
    /// Mean absolute consecutive period difference over mean period
    pub local: f64,
    /// Mean absolute consecutive period difference (s)
    pub absolute: f64,
    /// Relative average perturbation (3-point)
    pub rap: f64,
    /// Five-point period perturbation quotient
    pub ppq5: f64,
    /// Difference of differences of periods, 3 x RAP
    pub ddp: f64,
}

impl Jitter {
    /// `None` when there are too few cycles for the 5-point quotient
    pub fn compute(sequences: &[Vec<Cycle>]) -> Option<Self> {
        let periods = project(sequences, |c| c.period);
        let mean_period = overall_mean(&periods)?;
        let absolute = mean_abs_diff(&periods)?;
        let rap = perturbation_quotient(&periods, 3)? / mean_period;

        Some(Self {
            local: absolute / mean_period,
            absolute,
            rap,
            ppq5: perturbation_quotient(&periods, 5)? / mean_period,
            ddp: 3.0 * rap,
        })
    }
}

/// Amplitude perturbation measures
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Shimmer {
    /// Mean absolute consecutive amplitude difference over mean amplitude
    pub local: f64,
    /// Mean absolute consecutive amplitude ratio in dB
    pub local_db: f64,
    pub apq3: f64,
    pub apq5: f64,
    pub apq11: f64,
    /// 3 x APQ3
    pub dda: f64,
}

impl Shimmer {
    /// `None` when there are too few cycles for the 11-point quotient
    pub fn compute(sequences: &[Vec<Cycle>]) -> Option<Self> {
        let amplitudes = project(sequences, |c| c.amplitude);
        let mean_amplitude = overall_mean(&amplitudes)?;
        if mean_amplitude <= 0.0 {
            return None;
        }
        let apq3 = perturbation_quotient(&amplitudes, 3)? / mean_amplitude;

        Some(Self {
            local: mean_abs_diff(&amplitudes)? / mean_amplitude,
            local_db: mean_abs_db_ratio(&amplitudes)?,
            apq3,
            apq5: perturbation_quotient(&amplitudes, 5)? / mean_amplitude,
            apq11: perturbation_quotient(&amplitudes, 11)? / mean_amplitude,
            dda: 3.0 * apq3,
        })
    }
}

fn project(sequences: &[Vec<Cycle>], f: impl Fn(&Cycle) -> f64) -> Vec<Vec<f64>> {
    sequences.iter().map(|seq| seq.iter().map(&f).collect()).collect()
}

fn overall_mean(sequences: &[Vec<f64>]) -> Option<f64> {
    let count: usize = sequences.iter().map(Vec::len).sum();
    if count == 0 {
        return None;
    }
    Some(sequences.iter().flatten().sum::<f64>() / count as f64)
}

fn mean_abs_diff(sequences: &[Vec<f64>]) -> Option<f64> {
    average(
        sequences
            .iter()
            .flat_map(|seq| seq.windows(2).map(|w| (w[1] - w[0]).abs())),
    )
}

fn mean_abs_db_ratio(sequences: &[Vec<f64>]) -> Option<f64> {
    average(sequences.iter().flat_map(|seq| {
        seq.windows(2)
            .filter(|w| w[0] > 0.0 && w[1] > 0.0)
            .map(|w| (20.0 * (w[1] / w[0]).log10()).abs())
    }))
}

/// Mean absolute deviation of each value from the centered `width`-point average
fn perturbation_quotient(sequences: &[Vec<f64>], width: usize) -> Option<f64> {
    debug_assert!(width % 2 == 1);
    average(sequences.iter().flat_map(|seq| {
        seq.windows(width).map(move |w| {
            let local_mean = w.iter().sum::<f64>() / width as f64;
            (w[width / 2] - local_mean).abs()
        })
    }))
}

fn average(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequence(periods: &[f64], amplitudes: &[f64]) -> Vec<Cycle> {
        periods
            .iter()
            .zip(amplitudes)
            .map(|(&period, &amplitude)| Cycle { period, amplitude })
            .collect()
    }

    #[test]
    fn test_steady_cycles_have_zero_perturbation() {
        let seq = sequence(&[0.005; 20], &[0.5; 20]);
        let jitter = Jitter::compute(&[seq.clone()]).unwrap();
        let shimmer = Shimmer::compute(&[seq]).unwrap();
        for value in [jitter.local, jitter.absolute, jitter.rap, jitter.ppq5, jitter.ddp] {
            assert!(value.abs() < 1e-12);
        }
        for value in [
            shimmer.local,
            shimmer.local_db,
            shimmer.apq3,
            shimmer.apq5,
            shimmer.apq11,
            shimmer.dda,
        ] {
            assert!(value.abs() < 1e-12);
        }
    }

    #[test]
    fn test_alternating_periods() {
        // Periods alternate 4 ms / 6 ms
        let periods: Vec<f64> = (0..12).map(|i| if i % 2 == 0 { 0.004 } else { 0.006 }).collect();
        let seq = sequence(&periods, &[1.0; 12]);
        let jitter = Jitter::compute(&[seq]).unwrap();

        assert!((jitter.absolute - 0.002).abs() < 1e-12);
        assert!((jitter.local - 0.4).abs() < 1e-9);
        // |6 - 14/3| = |4 - 16/3| = 4/3 ms for every interior point
        assert!((jitter.rap - (0.004 / 3.0) / 0.005).abs() < 1e-9);
        assert!((jitter.ddp - 3.0 * jitter.rap).abs() < 1e-15);
    }

    #[test]
    fn test_shimmer_db() {
        let amplitudes: Vec<f64> = (0..12).map(|i| if i % 2 == 0 { 1.0 } else { 0.5 }).collect();
        let seq = sequence(&[0.005; 12], &amplitudes);
        let shimmer = Shimmer::compute(&[seq]).unwrap();
        assert!((shimmer.local_db - 20.0 * 2.0f64.log10()).abs() < 1e-9);
        assert!((shimmer.dda - 3.0 * shimmer.apq3).abs() < 1e-15);
    }

    #[test]
    fn test_too_few_cycles() {
        let seq = sequence(&[0.005; 4], &[0.5; 4]);
        assert!(Jitter::compute(&[seq.clone()]).is_none());
        assert!(Shimmer::compute(&[seq]).is_none());
        assert!(Jitter::compute(&[]).is_none());
    }

    #[test]
    fn test_sequences_are_not_joined() {
        // Each sequence is steady on its own; the jump between them must not count
        let a = sequence(&[0.004; 6], &[1.0; 6]);
        let b = sequence(&[0.008; 6], &[1.0; 6]);
        let jitter = Jitter::compute(&[a, b]).unwrap();
        assert_eq!(jitter.absolute, 0.0);
    }
}
