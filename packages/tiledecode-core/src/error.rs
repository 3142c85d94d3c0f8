use thiserror::Error;

use crate::geometry::OpKind;
use crate::tile_store::TileCoord;

/// Errors raised while decoding a tile into features.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("ring does not end with closepath (ends with {last:?})")]
    UnterminatedRing { last: OpKind },

    #[error("polygon begins with an inner ring (area {area})")]
    InvalidPolygonStart { area: f64 },

    #[error("out of bounds feature key ({index} in {len})")]
    KeyIndexOutOfRange { index: u32, len: usize },

    #[error("out of bounds feature value ({index} in {len})")]
    ValueIndexOutOfRange { index: u32, len: usize },

    #[error("unsupported geometry kind {0}")]
    UnsupportedGeometryKind(i32),

    #[error("failed to decompress tile: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("PBF decoding error: {0}")]
    Protobuf(String),

    #[error("write error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no tile found at {0} or any lower zoom")]
    TileNotFound(TileCoord),

    #[error("layer {layer:?}, feature {index}: {source}")]
    InFeature {
        layer: String,
        index: usize,
        #[source]
        source: Box<DecodeError>,
    },

    #[error("tile {coord}: {source}")]
    InTile {
        coord: TileCoord,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Attach the tile coordinate to an error, unless it already carries one.
    pub fn in_tile(self, coord: TileCoord) -> Self {
        match self {
            err @ DecodeError::InTile { .. } => err,
            err => DecodeError::InTile {
                coord,
                source: Box::new(err),
            },
        }
    }

    /// The innermost error, with tile/feature context peeled off.
    pub fn root_cause(&self) -> &DecodeError {
        match self {
            DecodeError::InFeature { source, .. } | DecodeError::InTile { source, .. } => {
                source.root_cause()
            }
            err => err,
        }
    }
}

/// Result type for decoding operations.
pub type Result<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_context_names_coordinate_and_cause() {
        let err = DecodeError::KeyIndexOutOfRange { index: 7, len: 3 }
            .in_tile(TileCoord::new(14, 8190, 5447));
        assert_eq!(
            err.to_string(),
            "tile 14/8190/5447: out of bounds feature key (7 in 3)"
        );
    }

    #[test]
    fn in_tile_does_not_wrap_twice() {
        let coord = TileCoord::new(3, 1, 2);
        let err = DecodeError::UnsupportedGeometryKind(9)
            .in_tile(coord)
            .in_tile(TileCoord::new(2, 0, 1));
        assert!(err.to_string().starts_with("tile 3/1/2:"));
        assert!(matches!(
            err.root_cause(),
            DecodeError::UnsupportedGeometryKind(9)
        ));
    }
}
