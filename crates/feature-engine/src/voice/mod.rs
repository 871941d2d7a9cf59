//! Voice Feature Extraction
//!
//! Turns a decoded utterance into the 22-slot voice vector: pitch statistics,
//! jitter, shimmer, noise ratios and nonlinear measures of the voiced pitch
//! sequence.

mod harmonicity;
mod nonlinear;
mod perturbation;
mod pitch;

pub use harmonicity::{Harmonicity, HarmonicityAnalyzer};
pub use nonlinear::{
    detrended_fluctuation, pitch_period_entropy, recurrence_period_density_entropy, PitchSpread,
};
pub use perturbation::{Jitter, Shimmer};
pub use pitch::{cycles, detect_pulses, track_pitch, Cycle, PitchTrack, Pulse};

use crate::error::ExtractionError;
use crate::schema::{FeatureVector, SchemaId, VOICE_SCHEMA};
use crate::statistics::StatisticalFeatures;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Decoded mono audio
#[derive(Debug, Clone, PartialEq)]
pub struct AudioWaveform {
    /// Amplitudes, nominally in [-1, 1]
    pub samples: Vec<f64>,
    /// Samples per second
    pub sample_rate: u32,
}

impl AudioWaveform {
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Voice analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Analysis frame length (s)
    pub frame_secs: f64,
    /// Hop between frames (s)
    pub hop_secs: f64,
    /// Pitch floor (Hz)
    pub min_pitch_hz: f64,
    /// Pitch ceiling (Hz)
    pub max_pitch_hz: f64,
    /// Frames quieter than this RMS are unvoiced
    pub min_rms: f64,
    /// McLeod clarity threshold
    pub clarity_threshold: f64,
    /// Largest ratio between neighbouring periods within one sequence
    pub max_period_factor: f64,
    /// Fewer voiced frames than this is insufficient signal
    pub min_voiced_frames: usize,
    /// Recurrence threshold for RPDE (Hz)
    pub recurrence_threshold_hz: f64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            frame_secs: 0.04,
            hop_secs: 0.01,
            min_pitch_hz: 75.0,
            max_pitch_hz: 600.0,
            min_rms: 0.01,
            clarity_threshold: 0.6,
            max_period_factor: 1.3,
            min_voiced_frames: 16,
            recurrence_threshold_hz: 1.0,
        }
    }
}

impl VoiceConfig {
    /// Frame length in samples
    pub fn frame_len(&self, sample_rate: u32) -> usize {
        ((self.frame_secs * sample_rate as f64).round() as usize).max(1)
    }

    /// Hop length in samples
    pub fn hop_len(&self, sample_rate: u32) -> usize {
        ((self.hop_secs * sample_rate as f64).round() as usize).max(1)
    }
}

/// Utterance feature extractor
#[derive(Debug, Clone, Default)]
pub struct VoiceExtractor {
    config: VoiceConfig,
}

impl VoiceExtractor {
    pub fn new(config: VoiceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VoiceConfig {
        &self.config
    }

    /// Extract the voice feature vector from a waveform
    pub fn extract(&self, waveform: &AudioWaveform) -> Result<FeatureVector, ExtractionError> {
        let sample_rate = waveform.sample_rate;
        let samples = &waveform.samples;
        if sample_rate == 0 {
            return Err(insufficient("sample rate is zero"));
        }
        // Pitch ceiling must be resolvable
        if (sample_rate as f64) / 2.0 <= self.config.max_pitch_hz {
            return Err(insufficient(format!("sample rate {} Hz is too low", sample_rate)));
        }
        let frame_len = self.config.frame_len(sample_rate);
        if samples.len() < frame_len {
            return Err(insufficient(format!(
                "{} samples is shorter than one {}-sample frame",
                samples.len(),
                frame_len
            )));
        }

        let track = track_pitch(samples, sample_rate, &self.config);
        let voiced = track.voiced();
        debug!(
            frames = track.frequencies.len(),
            voiced = voiced.len(),
            duration = waveform.duration_secs(),
            "Tracked pitch"
        );
        if voiced.len() < self.config.min_voiced_frames {
            return Err(insufficient(format!(
                "{} voiced frames, need at least {}",
                voiced.len(),
                self.config.min_voiced_frames
            )));
        }

        let pulses = detect_pulses(samples, sample_rate, &track);
        let sequences = cycles(&pulses, &self.config);
        let jitter = Jitter::compute(&sequences)
            .ok_or_else(|| insufficient("too few glottal cycles for jitter"))?;
        let shimmer = Shimmer::compute(&sequences)
            .ok_or_else(|| insufficient("too few glottal cycles for shimmer"))?;
        let noise = HarmonicityAnalyzer::new(track.frame_len)
            .analyze(samples, sample_rate, &track, &self.config)
            .ok_or_else(|| insufficient("no voiced frame with energy"))?;
        let dfa = detrended_fluctuation(&voiced)
            .ok_or_else(|| insufficient("pitch sequence too short for DFA"))?;

        let f0 = StatisticalFeatures::compute(&voiced);
        let spread = PitchSpread::compute(&voiced);
        let rpde = recurrence_period_density_entropy(&voiced, self.config.recurrence_threshold_hz);
        let ppe = pitch_period_entropy(&voiced);

        let values = vec![
            f0.mean,
            f0.max,
            f0.min,
            jitter.local,
            jitter.absolute,
            jitter.rap,
            jitter.ppq5,
            jitter.ddp,
            shimmer.local,
            shimmer.local_db,
            shimmer.apq3,
            shimmer.apq5,
            shimmer.apq11,
            shimmer.dda,
            noise.nhr,
            noise.hnr,
            rpde,
            dfa,
            spread.spread1,
            spread.spread2,
            spread.d2,
            ppe,
        ];
        debug_assert_eq!(values.len(), VOICE_SCHEMA.len());

        debug!(
            cycles = sequences.iter().map(Vec::len).sum::<usize>(),
            mean_f0 = f0.mean,
            "Extracted voice features"
        );
        Ok(FeatureVector::new(SchemaId::Voice, values))
    }
}

fn insufficient(reason: impl Into<String>) -> ExtractionError {
    ExtractionError::InsufficientSignal(reason.into())
}
