//! Audio Upload Handling

use crate::error::ApiError;
use feature_engine::AudioWaveform;
use hound::{SampleFormat, WavReader};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Write an upload to a scoped temporary file, removed when the handle drops
pub fn spool_upload(bytes: &[u8]) -> Result<NamedTempFile, ApiError> {
    let internal = |e: std::io::Error| ApiError::Internal(format!("could not store upload: {}", e));

    let mut file = tempfile::Builder::new()
        .prefix("neuroplay-upload-")
        .suffix(".wav")
        .tempfile()
        .map_err(internal)?;
    file.write_all(bytes).map_err(internal)?;
    file.flush().map_err(internal)?;

    debug!("Spooled {} byte upload to {}", bytes.len(), file.path().display());
    Ok(file)
}

/// Decode a WAV file to the first channel scaled into [-1, 1]
pub fn decode_wav(path: &Path) -> Result<AudioWaveform, ApiError> {
    let upstream = |e: hound::Error| ApiError::UpstreamIo(format!("could not decode audio: {}", e));

    let reader = WavReader::open(path).map_err(upstream)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let samples: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .step_by(channels)
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>(),
        SampleFormat::Int => {
            let full_scale = 2f64.powi(i32::from(spec.bits_per_sample) - 1);
            reader
                .into_samples::<i32>()
                .step_by(channels)
                .map(|s| s.map(|v| f64::from(v) / full_scale))
                .collect::<Result<_, _>>()
        }
    }
    .map_err(upstream)?;

    debug!(
        "Decoded {} samples at {} Hz ({} channel(s), {} bit {:?})",
        samples.len(),
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample,
        spec.sample_format
    );
    Ok(AudioWaveform::new(samples, spec.sample_rate))
}
