use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::boundary::BoundaryFlags;
use crate::config::InvalidFeaturePolicy;
use crate::error::{DecodeError, Result};
use crate::geometry::{build_geometry, GeomKind, Operation};
use crate::properties::{map_properties_into, PropertyMap, PropertyValue, RawValue};

/// Name of the synthetic property holding a feature's boundary flags.
pub const OFFTILE_KEY: &str = "offtile";

/// A feature as it comes out of the tile, before geometry reconstruction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawFeature {
    pub id: Option<u64>,
    pub kind: GeomKind,
    pub ops: Vec<Operation>,
    /// Flattened `(key index, value index)` pairs.
    pub tags: Vec<u32>,
}

/// A layer as it comes out of the tile, with its shared key/value tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawLayer {
    pub name: String,
    pub extent: i64,
    pub version: u32,
    pub keys: Vec<String>,
    pub values: Vec<RawValue>,
    pub features: Vec<RawFeature>,
}

/// A decoded feature: tile-local geometry plus typed properties.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub id: Option<u64>,
    pub geometry: Geometry<i64>,
    pub properties: PropertyMap,
    /// Tile edges the geometry extends beyond; also stored as the `offtile` property.
    pub offtile: BoundaryFlags,
}

impl Feature {
    pub fn is_within_tile(&self) -> bool {
        self.offtile.is_within()
    }
}

/// A decoded layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub name: String,
    pub extent: i64,
    pub version: u32,
    pub features: Vec<Feature>,
    /// Features dropped under [`InvalidFeaturePolicy::Skip`].
    pub skipped: usize,
}

/// Build one feature from its raw form and the enclosing layer's tables.
pub fn assemble_feature(raw: &RawFeature, layer: &RawLayer) -> Result<Feature> {
    let (geometry, offtile) = build_geometry(raw.kind, &raw.ops, layer.extent)?;

    let mut properties = PropertyMap::new();
    properties.insert(OFFTILE_KEY.to_string(), PropertyValue::UInt(offtile.bits()));
    map_properties_into(&mut properties, &raw.tags, &layer.keys, &layer.values)?;

    Ok(Feature {
        id: raw.id,
        geometry,
        properties,
        offtile,
    })
}

/// Build every feature of a layer, in order.
///
/// With [`InvalidFeaturePolicy::Abort`] the first bad feature fails the
/// layer; with [`InvalidFeaturePolicy::Skip`] it is dropped and counted.
pub fn assemble_layer(raw: &RawLayer, policy: InvalidFeaturePolicy) -> Result<Layer> {
    let mut features = Vec::with_capacity(raw.features.len());
    let mut skipped = 0;

    for (index, raw_feature) in raw.features.iter().enumerate() {
        match assemble_feature(raw_feature, raw) {
            Ok(feature) => features.push(feature),
            Err(err) => {
                let err = DecodeError::InFeature {
                    layer: raw.name.clone(),
                    index,
                    source: Box::new(err),
                };
                match policy {
                    InvalidFeaturePolicy::Abort => return Err(err),
                    InvalidFeaturePolicy::Skip => {
                        warn!("Skipping invalid feature: {}", err);
                        skipped += 1;
                    }
                }
            }
        }
    }

    debug!(
        layer = %raw.name,
        features = features.len(),
        skipped,
        "assembled layer"
    );

    Ok(Layer {
        name: raw.name.clone(),
        extent: raw.extent,
        version: raw.version,
        features,
        skipped,
    })
}
