//! Feature Vector Schemas
//!
//! A classifier is trained against one exact slot order. The order lives here,
//! as named and versioned lists shared by the extractors and the inference
//! engine, and is never inferred from map iteration.

use serde::{Deserialize, Serialize};

/// Ordered list of named feature slots
#[derive(Debug, PartialEq, Eq)]
pub struct FeatureSchema {
    /// Schema name
    pub name: &'static str,
    /// Schema version, bumped on any slot change
    pub version: u32,
    /// Slot names in vector order
    pub slots: &'static [&'static str],
}

impl FeatureSchema {
    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Position of a named slot
    pub fn index_of(&self, slot: &str) -> Option<usize> {
        self.slots.iter().position(|s| *s == slot)
    }

    /// `name/vN` identifier used in logs and health output
    pub fn id(&self) -> String {
        format!("{}/v{}", self.name, self.version)
    }
}

/// Drawing pipeline schema (16 slots)
pub static DRAWING_SCHEMA: FeatureSchema = FeatureSchema {
    name: "drawing",
    version: 1,
    slots: &[
        "x_mean",
        "x_std",
        "x_range",
        "x_tremor_energy",
        "y_mean",
        "y_std",
        "y_range",
        "y_tremor_energy",
        "pressure_mean",
        "pressure_std",
        "pressure_range",
        "pressure_tremor_energy",
        "distance_total",
        "duration",
        "speed_mean",
        "speed_std",
    ],
};

/// Voice pipeline schema (22 slots)
pub static VOICE_SCHEMA: FeatureSchema = FeatureSchema {
    name: "voice",
    version: 1,
    slots: &[
        "mean_f0",
        "max_f0",
        "min_f0",
        "jitter_local",
        "jitter_abs",
        "jitter_rap",
        "jitter_ppq5",
        "jitter_ddp",
        "shimmer_local",
        "shimmer_db",
        "shimmer_apq3",
        "shimmer_apq5",
        "shimmer_apq11",
        "shimmer_dda",
        "nhr",
        "hnr",
        "rpde",
        "dfa",
        "spread1",
        "spread2",
        "d2",
        "ppe",
    ],
};

/// Identifies which schema a vector was built against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaId {
    Drawing,
    Voice,
}

impl SchemaId {
    /// Resolve to the static schema definition
    pub fn schema(&self) -> &'static FeatureSchema {
        match self {
            SchemaId::Drawing => &DRAWING_SCHEMA,
            SchemaId::Voice => &VOICE_SCHEMA,
        }
    }
}

/// Feature vector for ML inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Schema the values were laid out against
    pub schema: SchemaId,
    /// Values in schema slot order
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(schema: SchemaId, values: Vec<f64>) -> Self {
        Self { schema, values }
    }

    /// Value of a named slot
    pub fn get(&self, slot: &str) -> Option<f64> {
        self.schema
            .schema()
            .index_of(slot)
            .and_then(|i| self.values.get(i).copied())
    }

    /// Slot names paired with values, for logging
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        self.schema
            .schema()
            .slots
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
