// Per-tile orchestration: fetch from a store, decode every selected layer and
// split the result into inside-tile output and boundary-crossing remainders.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::DecodeConfig;
use crate::error::{DecodeError, Result};
use crate::feature::{assemble_layer, Feature, Layer};
use crate::geometry::GeomKind;
use crate::mvt_source;
use crate::partition::{partition, FeatureSink};
use crate::tile_store::{TileCoord, TileStore};

/// Boundary-crossing features of one tile, keyed by layer name.
pub type RemainderMap = BTreeMap<String, Vec<Feature>>;

/// All selected layers of one tile.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedTile {
    pub coord: TileCoord,
    pub compressed: bool,
    pub layers: Vec<Layer>,
}

impl DecodedTile {
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Features dropped across all layers under the skip policy.
    pub fn skipped(&self) -> usize {
        self.layers.iter().map(|l| l.skipped).sum()
    }
}

/// Geometry type counts for one layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerStats {
    pub name: String,
    pub points: usize,
    pub lines: usize,
    pub polygons: usize,
    pub extent: i64,
}

/// Summary of a tile without reconstructing any geometry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileStats {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
    pub bytes: usize,
    pub compressed: bool,
    pub layers: Vec<LayerStats>,
}

pub struct TileDecoder {
    config: DecodeConfig,
}

impl TileDecoder {
    pub fn new(config: DecodeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Decode one tile blob. Any error is reported against `coord`.
    pub fn decode_tile(&self, coord: TileCoord, data: &[u8]) -> Result<DecodedTile> {
        self.decode_layers(data)
            .map(|(layers, compressed)| DecodedTile {
                coord,
                compressed,
                layers,
            })
            .map_err(|e| e.in_tile(coord))
    }

    fn decode_layers(&self, data: &[u8]) -> Result<(Vec<Layer>, bool)> {
        let (raw_layers, compressed) = mvt_source::decode_tile(data)?;

        let mut layers = Vec::new();
        for raw in raw_layers.iter().filter(|l| self.config.wants_layer(&l.name)) {
            layers.push(assemble_layer(raw, self.config.invalid_feature)?);
        }
        Ok((layers, compressed))
    }

    /// Find `coord` in the store, falling back to the nearest lower-zoom tile
    /// that covers it.
    pub fn find_tile<S: TileStore + ?Sized>(
        &self,
        store: &S,
        coord: TileCoord,
    ) -> Result<(TileCoord, Vec<u8>)> {
        let mut current = coord;
        loop {
            if let Some(data) = store.get_tile(current) {
                if current != coord {
                    warn!("Using tile {} instead of {}", current, coord);
                }
                return Ok((current, data));
            }
            current = current.parent().ok_or(DecodeError::TileNotFound(coord))?;
        }
    }

    /// Decode `coord`, or the nearest stored ancestor.
    pub fn decode_from_store<S: TileStore + ?Sized>(
        &self,
        store: &S,
        coord: TileCoord,
    ) -> Result<DecodedTile> {
        let (found, data) = self.find_tile(store, coord)?;
        self.decode_tile(found, &data)
    }

    /// Decode every stored tile inside the configured zoom range, in store order.
    pub fn decode_range<S: TileStore + ?Sized>(&self, store: &S) -> Result<Vec<DecodedTile>> {
        let mut tiles = Vec::new();
        for coord in store.tile_coords(self.config.min_zoom, self.config.max_zoom) {
            let data = store.get_tile(coord).ok_or(DecodeError::TileNotFound(coord))?;
            tiles.push(self.decode_tile(coord, &data)?);
        }
        Ok(tiles)
    }

    /// Decode one tile, write its inside-tile features to `sink` and return
    /// the features that cross the tile boundary, per layer.
    ///
    /// The remainders are not stitched with neighbouring tiles.
    pub fn load_feature_map<S, K>(
        &self,
        store: &S,
        coord: TileCoord,
        sink: &mut K,
    ) -> Result<RemainderMap>
    where
        S: TileStore + ?Sized,
        K: FeatureSink + ?Sized,
    {
        let data = store.get_tile(coord).ok_or(DecodeError::TileNotFound(coord))?;
        let tile = self.decode_tile(coord, &data)?;

        let mut remainders = RemainderMap::new();
        for layer in tile.layers {
            let part = partition(layer, &mut *sink).map_err(|e| e.in_tile(coord))?;
            remainders.insert(part.layer, part.remainder);
        }

        let total: usize = remainders.values().map(Vec::len).sum();
        info!("Extracted {} total features that spanned tile {}", total, coord);
        Ok(remainders)
    }

    /// Per-layer geometry type counts of a tile blob.
    pub fn tile_stats(&self, coord: TileCoord, data: &[u8]) -> Result<TileStats> {
        let (raw_layers, compressed) = mvt_source::decode_tile(data).map_err(|e| e.in_tile(coord))?;

        let layers = raw_layers
            .iter()
            .map(|layer| {
                let count =
                    |kind: GeomKind| layer.features.iter().filter(|f| f.kind == kind).count();
                LayerStats {
                    name: layer.name.clone(),
                    points: count(GeomKind::Point),
                    lines: count(GeomKind::Line),
                    polygons: count(GeomKind::Polygon),
                    extent: layer.extent,
                }
            })
            .collect();

        Ok(TileStats {
            zoom: coord.z,
            x: coord.x,
            y: coord.y,
            bytes: data.len(),
            compressed,
            layers,
        })
    }
}
