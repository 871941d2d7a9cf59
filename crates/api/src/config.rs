//! Server Configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `NEUROPLAY__*` environment variables (`__` separates nested
//! keys, e.g. `NEUROPLAY__VOICE_MODEL__PATH`).

use config::{Config, ConfigError, Environment, File};
use feature_engine::VoiceConfig;
use inference_engine::{ModelConfig, ModelKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "NEUROPLAY_CONFIG";

/// Config file picked up from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "neuroplay.toml";

const ENV_PREFIX: &str = "NEUROPLAY";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,
    /// Default log filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
    /// Request body cap, applies to audio uploads
    pub max_upload_bytes: usize,
    /// Drawing classifier artifacts
    pub drawing_model: ModelConfig,
    /// Voice classifier artifacts
    pub voice_model: ModelConfig,
    /// Voice analysis parameters
    pub voice: VoiceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            max_upload_bytes: 16 * 1024 * 1024,
            drawing_model: ModelConfig {
                kind: ModelKind::Linear,
                path: PathBuf::from("models/drawing_model.json"),
                scaler_path: Some(PathBuf::from("models/drawing_scaler.json")),
            },
            voice_model: ModelConfig {
                kind: ModelKind::Linear,
                path: PathBuf::from("models/voice_model.json"),
                scaler_path: None,
            },
            voice: VoiceConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from `NEUROPLAY_CONFIG` (required if set) or `neuroplay.toml` (optional)
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).ok();
        Self::load_from(path.as_deref())
    }

    /// Load with an explicit file; `None` falls back to the optional default file
    pub fn load_from(path: Option<&str>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = ServerConfig::load_from(None).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.drawing_model.kind, ModelKind::Linear);
        assert_eq!(config.voice.min_voiced_frames, 16);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
bind_addr = "127.0.0.1:8080"
log_json = true

[voice_model]
kind = "onnx"
path = "models/voice.onnx"

[voice]
min_pitch_hz = 60.0
"#
        )
        .unwrap();

        let config = ServerConfig::load_from(file.path().to_str()).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert!(config.log_json);
        assert_eq!(config.voice_model.kind, ModelKind::Onnx);
        assert_eq!(config.voice_model.path, PathBuf::from("models/voice.onnx"));
        assert_eq!(config.voice.min_pitch_hz, 60.0);
        // Untouched sections keep their defaults
        assert_eq!(config.voice.max_pitch_hz, 600.0);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_explicit_file() {
        assert!(ServerConfig::load_from(Some("/nonexistent/neuroplay.toml")).is_err());
    }
}
