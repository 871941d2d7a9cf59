//! Drawing Feature Extraction
//!
//! Turns one pen/touch stroke into the 16-slot drawing vector: per-channel
//! statistics and tremor energy for x, y and pressure, followed by path
//! kinematics.

use crate::error::ExtractionError;
use crate::filter::{BandPassFilter, FrequencyBand, TREMOR_BAND, TREMOR_FILTER_ORDER};
use crate::schema::{FeatureVector, SchemaId, DRAWING_SCHEMA};
use crate::statistics::{diff, median, std_dev, StatisticalFeatures};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sampling frequency used when timestamp spacing is degenerate (Hz)
pub const DEFAULT_SAMPLE_RATE: f64 = 100.0;

/// Added to every time delta before dividing (s)
const DT_EPSILON: f64 = 1e-6;

/// Minimum stroke length
pub const MIN_STROKE_POINTS: usize = 2;

/// One pen/touch sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub pressure: f64,
    /// Milliseconds
    pub timestamp: f64,
}

/// Stroke feature extractor
#[derive(Debug, Clone)]
pub struct DrawingExtractor {
    /// Band whose energy is measured per channel
    band: FrequencyBand,
    /// Fallback when the median time delta is zero
    fallback_sample_rate: f64,
}

impl Default for DrawingExtractor {
    fn default() -> Self {
        Self {
            band: TREMOR_BAND,
            fallback_sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl DrawingExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract the drawing feature vector from a stroke
    pub fn extract(&self, stroke: &[SamplePoint]) -> Result<FeatureVector, ExtractionError> {
        if stroke.len() < MIN_STROKE_POINTS {
            return Err(ExtractionError::InsufficientData {
                required: MIN_STROKE_POINTS,
                actual: stroke.len(),
            });
        }

        let t0 = stroke[0].timestamp;
        let times: Vec<f64> = stroke.iter().map(|p| (p.timestamp - t0) / 1000.0).collect();
        let fs = self.sampling_frequency(&times);
        let filter = BandPassFilter::butterworth(TREMOR_FILTER_ORDER, self.band, fs)?;

        let xs: Vec<f64> = stroke.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = stroke.iter().map(|p| p.y).collect();
        let pressures: Vec<f64> = stroke.iter().map(|p| p.pressure).collect();

        let mut values = Vec::with_capacity(DRAWING_SCHEMA.len());
        for channel in [&xs, &ys, &pressures] {
            let stats = StatisticalFeatures::compute(channel);
            values.push(stats.mean);
            values.push(stats.std_dev);
            values.push(stats.range);
            values.push(filter.energy(channel));
        }

        let kinematics = Kinematics::compute(&xs, &ys, &times);
        values.push(kinematics.distance_total);
        values.push(kinematics.duration);
        values.push(kinematics.speed_mean);
        values.push(kinematics.speed_std);

        debug!(points = stroke.len(), fs, "Extracted drawing features");
        Ok(FeatureVector::new(SchemaId::Drawing, values))
    }

    fn sampling_frequency(&self, times: &[f64]) -> f64 {
        match estimate_sampling_frequency(times) {
            Some(fs) => fs,
            None => {
                debug!(
                    fallback = self.fallback_sample_rate,
                    "Degenerate timestamp spacing, using fallback sampling rate"
                );
                self.fallback_sample_rate
            }
        }
    }
}

/// Reciprocal of the median inter-sample delta (timestamps in seconds).
///
/// `None` when there are no deltas or the median delta is not positive.
pub fn estimate_sampling_frequency(times: &[f64]) -> Option<f64> {
    let deltas = diff(times);
    let fs = 1.0 / median(&deltas)?;
    (fs.is_finite() && fs > 0.0).then_some(fs)
}

/// Path kinematics of a stroke
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kinematics {
    /// Sum of consecutive Euclidean displacements
    pub distance_total: f64,
    /// Last normalized timestamp (s)
    pub duration: f64,
    pub speed_mean: f64,
    pub speed_std: f64,
}

impl Kinematics {
    /// `times` are normalized seconds starting at zero
    pub fn compute(xs: &[f64], ys: &[f64], times: &[f64]) -> Self {
        let distances: Vec<f64> = xs
            .windows(2)
            .zip(ys.windows(2))
            .map(|(x, y)| (x[1] - x[0]).hypot(y[1] - y[0]))
            .collect();
        let speeds: Vec<f64> = distances
            .iter()
            .zip(diff(times))
            .map(|(d, dt)| d / (dt + DT_EPSILON))
            .collect();

        Self {
            distance_total: distances.iter().sum(),
            duration: times.last().copied().unwrap_or(0.0),
            speed_mean: crate::statistics::mean(&speeds),
            speed_std: std_dev(&speeds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64, y: f64, pressure: f64, timestamp: f64) -> SamplePoint {
        SamplePoint { x, y, pressure, timestamp }
    }

    /// Wobbly stroke sampled every 10 ms
    fn wobbly_stroke(n: usize, pressure_scale: f64) -> Vec<SamplePoint> {
        (0..n)
            .map(|i| {
                let t = i as f64 * 0.01;
                let wobble = (2.0 * std::f64::consts::PI * 5.0 * t).sin();
                point(
                    i as f64 + 0.5 * wobble,
                    2.0 * i as f64 - 0.3 * wobble,
                    pressure_scale * (0.6 + 0.1 * wobble + 0.01 * i as f64),
                    1_000.0 + i as f64 * 10.0,
                )
            })
            .collect()
    }

    #[test]
    fn test_short_stroke_rejected() {
        let extractor = DrawingExtractor::default();
        assert_eq!(
            extractor.extract(&[]),
            Err(ExtractionError::InsufficientData { required: 2, actual: 0 })
        );
        assert!(matches!(
            extractor.extract(&[point(0.0, 0.0, 1.0, 0.0)]),
            Err(ExtractionError::InsufficientData { actual: 1, .. })
        ));
    }

    #[test]
    fn test_three_point_scenario() {
        let stroke = [
            point(0.0, 0.0, 1.0, 0.0),
            point(1.0, 0.0, 1.0, 10.0),
            point(2.0, 0.0, 1.0, 20.0),
        ];
        let vector = DrawingExtractor::default().extract(&stroke).unwrap();

        assert_eq!(vector.len(), 16);
        assert_eq!(vector.schema, SchemaId::Drawing);
        assert!(vector.values.iter().all(|v| v.is_finite()));
        assert!((vector.get("duration").unwrap() - 0.02).abs() < 1e-12);
        assert!((vector.get("distance_total").unwrap() - 2.0).abs() < 1e-12);
        let speed = vector.get("speed_mean").unwrap();
        assert!(speed > 0.0 && speed.is_finite());
        assert!(vector.get("speed_std").unwrap().is_finite());
        assert!((vector.get("x_mean").unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(vector.get("pressure_range"), Some(0.0));
    }

    #[test]
    fn test_straight_line_distance() {
        let stroke = [point(0.0, 0.0, 0.5, 0.0), point(3.0, 4.0, 0.5, 10.0)];
        let vector = DrawingExtractor::default().extract(&stroke).unwrap();
        assert_eq!(vector.get("distance_total"), Some(5.0));
    }

    #[test]
    fn test_sampling_frequency_is_median_reciprocal() {
        let times: Vec<f64> = (0..20).map(|i| i as f64 * 0.008).collect();
        let fs = estimate_sampling_frequency(&times).unwrap();
        let expected = 1.0 / median(&diff(&times)).unwrap();
        assert_eq!(fs, expected);
        assert!((fs - 125.0).abs() < 1e-9);

        // One outlier gap does not move the median
        let jittery = [0.0, 0.01, 0.02, 0.5, 0.51];
        assert!((estimate_sampling_frequency(&jittery).unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_timestamps_fall_back() {
        assert_eq!(estimate_sampling_frequency(&[0.0]), None);
        assert_eq!(estimate_sampling_frequency(&[0.0, 0.0, 0.0, 0.01]), None);

        // Mostly tied timestamps still produce a vector
        let stroke = [
            point(0.0, 0.0, 1.0, 5.0),
            point(1.0, 1.0, 0.9, 5.0),
            point(2.0, 1.0, 0.8, 5.0),
            point(3.0, 2.0, 0.7, 15.0),
        ];
        let vector = DrawingExtractor::default().extract(&stroke).unwrap();
        assert!(vector.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_slow_sampling_rejected() {
        // 100 ms spacing puts 8 Hz above Nyquist
        let stroke = [point(0.0, 0.0, 1.0, 0.0), point(1.0, 0.0, 1.0, 100.0), point(2.0, 0.0, 1.0, 200.0)];
        assert!(matches!(
            DrawingExtractor::default().extract(&stroke),
            Err(ExtractionError::SamplingRateTooLow { .. })
        ));
    }

    #[test]
    fn test_pressure_scaling() {
        let k = 3.5;
        let base = DrawingExtractor::default().extract(&wobbly_stroke(120, 1.0)).unwrap();
        let scaled = DrawingExtractor::default().extract(&wobbly_stroke(120, k)).unwrap();

        let close = |a: f64, b: f64| (a - b).abs() <= 1e-9 * b.abs().max(1.0);
        for slot in ["pressure_mean", "pressure_std", "pressure_range"] {
            assert!(close(scaled.get(slot).unwrap(), k * base.get(slot).unwrap()), "{}", slot);
        }
        let energy = base.get("pressure_tremor_energy").unwrap();
        assert!(energy > 0.0);
        assert!(close(scaled.get("pressure_tremor_energy").unwrap(), k * k * energy));

        // Other channels are untouched
        assert_eq!(scaled.get("x_tremor_energy"), base.get("x_tremor_energy"));
        assert_eq!(scaled.get("speed_mean"), base.get("speed_mean"));
    }

    #[test]
    fn test_sample_point_json() {
        let point: SamplePoint =
            serde_json::from_str(r#"{"x": 1.5, "y": 2, "pressure": 0.4, "timestamp": 1700000000000}"#).unwrap();
        assert_eq!(point.y, 2.0);
        assert_eq!(point.timestamp, 1_700_000_000_000.0);
    }
}
