// Adapter from raw tile bytes to the engine's RawLayer input: gzip detection,
// protobuf decoding and command-integer geometry decoding.

use std::io::Read;

use flate2::read::GzDecoder;
use geozero::mvt::tile::{self, GeomType};
use geozero::mvt::{Message, Tile};
use tracing::debug;

use crate::error::{DecodeError, Result};
use crate::feature::{RawFeature, RawLayer};
use crate::geometry::{GeomKind, Operation};
use crate::properties::RawValue;

/// Extent assumed when a layer does not declare one.
pub const DEFAULT_EXTENT: u32 = 4096;

const CMD_MOVE_TO: u32 = 1;
const CMD_LINE_TO: u32 = 2;
const CMD_CLOSE_PATH: u32 = 7;

// Check for the gzip magic number
fn is_gzipped(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1F && data[1] == 0x8B
}

/// Inflate gzipped tile data; anything else passes through untouched.
///
/// Also returns whether the input was compressed.
pub fn decompress(data: &[u8]) -> Result<(Vec<u8>, bool)> {
    if !is_gzipped(data) {
        return Ok((data.to_vec(), false));
    }

    debug!("Detected gzipped tile, decompressing");
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(DecodeError::Decompress)?;
    Ok((decompressed, true))
}

fn zigzag(param: u32) -> i64 {
    ((param >> 1) as i64) ^ -((param & 1) as i64)
}

/// Decode a feature's command integers into an absolute operation stream.
///
/// Parameters are zig-zag deltas from the running cursor. Decoding stops at a
/// truncated parameter run; unknown commands are skipped with their parameters.
pub fn decode_commands(commands: &[u32]) -> Vec<Operation> {
    let mut ops = Vec::new();
    let (mut cursor_x, mut cursor_y) = (0i64, 0i64);
    let mut i = 0;

    while i < commands.len() {
        let cmd_id = commands[i] & 0x7;
        let cmd_count = (commands[i] >> 3) as usize;
        i += 1;

        match cmd_id {
            CMD_MOVE_TO | CMD_LINE_TO => {
                for _ in 0..cmd_count {
                    if i + 1 >= commands.len() {
                        return ops;
                    }
                    cursor_x += zigzag(commands[i]);
                    cursor_y += zigzag(commands[i + 1]);
                    i += 2;

                    ops.push(if cmd_id == CMD_MOVE_TO {
                        Operation::move_to(cursor_x, cursor_y)
                    } else {
                        Operation::line_to(cursor_x, cursor_y)
                    });
                }
            }
            CMD_CLOSE_PATH => {
                for _ in 0..cmd_count {
                    ops.push(Operation::close_path());
                }
            }
            _ => {
                i += 2 * cmd_count;
            }
        }
    }

    ops
}

fn raw_value(value: &tile::Value) -> RawValue {
    // Fields are checked in declaration order; a well-formed value sets exactly one
    if let Some(s) = &value.string_value {
        RawValue::String(s.clone())
    } else if let Some(f) = value.float_value {
        RawValue::Float(f)
    } else if let Some(d) = value.double_value {
        RawValue::Double(d)
    } else if let Some(i) = value.int_value {
        RawValue::Int(i)
    } else if let Some(u) = value.uint_value {
        RawValue::UInt(u)
    } else if let Some(s) = value.sint_value {
        RawValue::SInt(s)
    } else if let Some(b) = value.bool_value {
        RawValue::Bool(b)
    } else {
        RawValue::Unset
    }
}

fn geom_kind(feature: &tile::Feature) -> GeomKind {
    match feature.r#type() {
        GeomType::Point => GeomKind::Point,
        GeomType::Linestring => GeomKind::Line,
        GeomType::Polygon => GeomKind::Polygon,
        GeomType::Unknown => GeomKind::Unknown(feature.r#type.unwrap_or(0)),
    }
}

/// Convert a protobuf layer into the engine's input form.
pub fn raw_layer(layer: &tile::Layer) -> RawLayer {
    RawLayer {
        name: layer.name.clone(),
        extent: layer.extent.unwrap_or(DEFAULT_EXTENT) as i64,
        version: layer.version,
        keys: layer.keys.clone(),
        values: layer.values.iter().map(raw_value).collect(),
        features: layer
            .features
            .iter()
            .map(|feature| RawFeature {
                id: feature.id,
                kind: geom_kind(feature),
                ops: decode_commands(&feature.geometry),
                tags: feature.tags.clone(),
            })
            .collect(),
    }
}

/// Decode a (possibly gzipped) tile blob into raw layers.
///
/// Also returns whether the blob was compressed.
pub fn decode_tile(data: &[u8]) -> Result<(Vec<RawLayer>, bool)> {
    let (data, compressed) = decompress(data)?;
    let tile = Tile::decode(data.as_slice()).map_err(|e| DecodeError::Protobuf(e.to_string()))?;
    Ok((tile.layers.iter().map(raw_layer).collect(), compressed))
}
