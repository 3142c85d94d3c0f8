//! Decodes vector tile layers into typed, tile-local geometries and
//! GeoJSON-ready features, flagging every feature that crosses the tile edge.

// Leaf geometry math
pub mod boundary;
pub mod intersect;
pub mod ring;
// Geometry reconstruction and feature assembly
pub mod geometry;
pub mod properties;
pub mod feature;
pub mod partition;
// Tile input and output
pub mod mvt_source;
pub mod tile_store;
pub mod geojson;
pub mod decoder;
pub mod config;
pub mod error;

pub use boundary::{classify, BoundaryFlags};
pub use config::{DecodeConfig, InvalidFeaturePolicy};
pub use decoder::{DecodedTile, RemainderMap, TileDecoder, TileStats};
pub use error::{DecodeError, Result};
pub use feature::{assemble_feature, assemble_layer, Feature, Layer, RawFeature, RawLayer};
pub use geometry::{build_geometry, GeomKind, OpKind, Operation};
pub use intersect::{edge_intercept, intersect_segments, Edge, EdgeIntersection};
pub use partition::{partition, FeatureSink, Partition};
pub use properties::{map_properties, PropertyMap, PropertyValue, RawValue};
pub use ring::{signed_area, Orientation, Ring};
pub use tile_store::{MemoryTileStore, TileCoord, TileStore};
