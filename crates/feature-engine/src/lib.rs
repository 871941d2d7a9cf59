//! Feature Engineering Engine
//!
//! Deterministic extraction of fixed-order feature vectors from raw drawing
//! strokes and voice recordings, plus the zero-phase band-pass filter the
//! drawing pipeline measures tremor with.

mod drawing;
mod error;
mod filter;
mod schema;
mod statistics;
pub mod voice;

pub use drawing::{estimate_sampling_frequency, DrawingExtractor, Kinematics, SamplePoint};
pub use error::ExtractionError;
pub use filter::{tremor_energy, BandPassFilter, Biquad, FrequencyBand, TREMOR_BAND};
pub use schema::{FeatureSchema, FeatureVector, SchemaId, DRAWING_SCHEMA, VOICE_SCHEMA};
pub use statistics::StatisticalFeatures;
pub use voice::{AudioWaveform, VoiceConfig, VoiceExtractor};
