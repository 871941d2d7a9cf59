//! Nonlinear Dynamics and Entropy Measures of the Pitch Sequence
//!
//! All functions take voiced pitch values only.

use crate::statistics::{diff, mean, std_dev};

/// Histogram bins for PPE and RPDE
pub const HISTOGRAM_BINS: usize = 20;

/// Added to every density bin before taking logs
pub const HISTOGRAM_EPSILON: f64 = 1e-6;

/// Keeps `ln F(n)` finite for a fluctuation-free sequence
const FLUCTUATION_EPSILON: f64 = 1e-12;

/// Smallest DFA box size
const DFA_MIN_BOX: usize = 4;

/// Number of log-spaced DFA box sizes before deduplication
const DFA_SCALES: usize = 12;

/// Bin counts and bin width over `[min, max]`.
///
/// Equal-valued input is binned over `[v - 0.5, v + 0.5]`; the last bin
/// includes its upper edge.
pub fn histogram(values: &[f64], bins: usize) -> (Vec<usize>, f64) {
    let mut counts = vec![0usize; bins];
    if values.is_empty() {
        return (counts, 1.0 / bins as f64);
    }

    let mut lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    (counts, width)
}

/// Shannon entropy (nats) of a density histogram with `HISTOGRAM_EPSILON`
/// added to every bin, normalized to a distribution
pub fn histogram_entropy(counts: &[usize], bin_width: f64) -> f64 {
    let total: usize = counts.iter().sum();
    let scale = if total > 0 { total as f64 * bin_width } else { 1.0 };
    let densities: Vec<f64> = counts
        .iter()
        .map(|&c| c as f64 / scale + HISTOGRAM_EPSILON)
        .collect();
    let sum: f64 = densities.iter().sum();

    densities
        .iter()
        .map(|d| d / sum)
        .map(|p| -p * p.ln())
        .sum()
}

/// Pitch period entropy
pub fn pitch_period_entropy(pitch: &[f64]) -> f64 {
    let (counts, width) = histogram(pitch, HISTOGRAM_BINS);
    histogram_entropy(&counts, width)
}

/// Recurrence period density entropy.
///
/// The recurrence matrix `|p_i - p_j| < threshold` is only ever counted,
/// never stored: its flattened 0/1 entries fall into the first and last bins.
pub fn recurrence_period_density_entropy(pitch: &[f64], threshold: f64) -> f64 {
    let n = pitch.len();
    let mut sorted = pitch.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    // Ordered pairs within the threshold, via a sliding window over sorted values
    let mut recurrent = 0usize;
    let mut hi = 0usize;
    for lo in 0..n {
        hi = hi.max(lo);
        while hi + 1 < n && sorted[hi + 1] - sorted[lo] < threshold {
            hi += 1;
        }
        // Pairs (lo, j) with lo < j <= hi, counted in both orders
        recurrent += 2 * (hi - lo);
    }
    // Diagonal entries, when the threshold admits equality at zero
    if threshold > 0.0 {
        recurrent += n;
    }

    let total = n * n;
    let mut counts = vec![0usize; HISTOGRAM_BINS];
    let width = 1.0 / HISTOGRAM_BINS as f64;
    match (recurrent, total - recurrent) {
        (0, _) | (_, 0) => counts[HISTOGRAM_BINS / 2] = total,
        (ones, zeros) => {
            counts[0] = zeros;
            counts[HISTOGRAM_BINS - 1] = ones;
        }
    }
    histogram_entropy(&counts, width)
}

/// Detrended fluctuation analysis scaling exponent.
///
/// `None` when the sequence is too short for two distinct box sizes.
pub fn detrended_fluctuation(series: &[f64]) -> Option<f64> {
    let n = series.len();
    let max_box = n / 2;
    if max_box <= DFA_MIN_BOX {
        return None;
    }

    let m = mean(series);
    let profile: Vec<f64> = series
        .iter()
        .scan(0.0, |acc, v| {
            *acc += v - m;
            Some(*acc)
        })
        .collect();

    let (lo, hi) = ((DFA_MIN_BOX as f64).ln(), (max_box as f64).ln());
    let mut sizes: Vec<usize> = (0..DFA_SCALES)
        .map(|i| (lo + (hi - lo) * i as f64 / (DFA_SCALES - 1) as f64).exp().round() as usize)
        .collect();
    sizes.dedup();

    let (log_sizes, log_fluct): (Vec<f64>, Vec<f64>) = sizes
        .iter()
        .map(|&size| {
            let boxes = n / size;
            let rss: f64 = profile
                .chunks_exact(size)
                .take(boxes)
                .map(detrended_residual)
                .sum();
            let fluctuation = (rss / (boxes * size) as f64).sqrt();
            ((size as f64).ln(), (fluctuation + FLUCTUATION_EPSILON).ln())
        })
        .unzip();

    linear_fit(&log_sizes, &log_fluct).map(|(slope, _)| slope)
}

/// Residual sum of squares after removing the least-squares line
fn detrended_residual(segment: &[f64]) -> f64 {
    let t: Vec<f64> = (0..segment.len()).map(|i| i as f64).collect();
    let Some((slope, intercept)) = linear_fit(&t, segment) else {
        return 0.0;
    };
    t.iter()
        .zip(segment)
        .map(|(x, y)| {
            let r = y - (slope * x + intercept);
            r * r
        })
        .sum()
}

/// Least-squares `(slope, intercept)`
fn linear_fit(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if x.len() < 2 {
        return None;
    }
    let mx = mean(x);
    let my = mean(y);
    let sxx: f64 = x.iter().map(|v| (v - mx) * (v - mx)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let slope = sxy / sxx;
    Some((slope, my - slope * mx))
}

/// Dispersion of the pitch sequence
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PitchSpread {
    /// Standard deviation of pitch
    pub spread1: f64,
    /// Standard deviation of first differences
    pub spread2: f64,
    /// Mean squared first difference
    pub d2: f64,
}

impl PitchSpread {
    pub fn compute(pitch: &[f64]) -> Self {
        let deltas = diff(pitch);
        let d2 = if deltas.is_empty() {
            0.0
        } else {
            deltas.iter().map(|d| d * d).sum::<f64>() / deltas.len() as f64
        };
        Self {
            spread1: std_dev(pitch),
            spread2: std_dev(&deltas),
            d2,
        }
    }
}
