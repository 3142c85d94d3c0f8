use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tile address in XYZ (slippy map) order: row 0 is the northernmost row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        TileCoord { z, x, y }
    }

    /// Row of this tile in TMS order, as used by MBTiles `tile_row`.
    pub fn tms_row(&self) -> u32 {
        flip_row(self.z, self.y)
    }

    /// Build a coordinate from an MBTiles `(zoom_level, tile_column, tile_row)` triple.
    pub fn from_tms(z: u8, column: u32, row: u32) -> Self {
        TileCoord::new(z, column, flip_row(z, row))
    }

    /// The tile one zoom level up that covers this one.
    pub fn parent(&self) -> Option<TileCoord> {
        if self.z == 0 {
            return None;
        }
        Some(TileCoord::new(self.z - 1, self.x / 2, self.y / 2))
    }
}

// Rows are u32, so zooms past 32 flip within the full u32 range
fn flip_row(z: u8, row: u32) -> u32 {
    let last_row = (1u64 << z.min(32)) - 1;
    let flipped = last_row.saturating_sub(u64::from(row));
    u32::try_from(flipped).unwrap_or(u32::MAX)
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Source of raw (possibly gzipped) tile blobs keyed by coordinate.
pub trait TileStore {
    fn get_tile(&self, coord: TileCoord) -> Option<Vec<u8>>;

    /// Every stored tile with `min_zoom <= z <= max_zoom`, ordered by zoom, column, row.
    fn tile_coords(&self, min_zoom: u8, max_zoom: u8) -> Vec<TileCoord>;
}

/// In-memory tile store.
#[derive(Clone, Debug, Default)]
pub struct MemoryTileStore {
    tiles: BTreeMap<TileCoord, Vec<u8>>,
}

impl MemoryTileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, coord: TileCoord, data: Vec<u8>) {
        self.tiles.insert(coord, data);
    }

    /// Insert using MBTiles (TMS) row numbering.
    pub fn insert_tms(&mut self, z: u8, column: u32, row: u32, data: Vec<u8>) {
        self.insert(TileCoord::from_tms(z, column, row), data);
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

impl TileStore for MemoryTileStore {
    fn get_tile(&self, coord: TileCoord) -> Option<Vec<u8>> {
        self.tiles.get(&coord).cloned()
    }

    fn tile_coords(&self, min_zoom: u8, max_zoom: u8) -> Vec<TileCoord> {
        // TileCoord orders by (z, x, y)
        self.tiles
            .keys()
            .filter(|c| c.z >= min_zoom && c.z <= max_zoom)
            .copied()
            .collect()
    }
}
