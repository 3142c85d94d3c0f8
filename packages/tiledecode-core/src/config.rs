use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// What to do with a feature that violates a structural invariant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidFeaturePolicy {
    /// Fail the whole tile.
    #[default]
    Abort,
    /// Drop the feature, log it and keep going.
    Skip,
}

/// Decoder settings, passed explicitly to every entry point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    // Layer names to decode; empty means all layers
    pub layers: BTreeSet<String>,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub invalid_feature: InvalidFeaturePolicy,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            layers: BTreeSet::new(),
            min_zoom: 0,
            max_zoom: 32,
            invalid_feature: InvalidFeaturePolicy::Abort,
        }
    }
}

impl DecodeConfig {
    /// Restrict decoding to the named layers.
    pub fn with_layers<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layers = layers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_invalid_feature(mut self, policy: InvalidFeaturePolicy) -> Self {
        self.invalid_feature = policy;
        self
    }

    /// Whether the layer filter selects `name`.
    pub fn wants_layer(&self, name: &str) -> bool {
        self.layers.is_empty() || self.layers.contains(name)
    }
}
