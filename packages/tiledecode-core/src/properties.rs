use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, Result};

/// A value from a layer's shared value table, as stored in the tile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    String(String),
    Float(f32),
    Double(f64),
    Int(i64),
    UInt(u64),
    SInt(i64),
    Bool(bool),
    /// A table entry with no value field set; tags pointing at it are ignored.
    Unset,
}

/// A typed feature property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Int(i64),
    UInt(u64),
    Bool(bool),
    Double(f64),
}

/// Feature properties in first-seen key order.
pub type PropertyMap = IndexMap<String, PropertyValue>;

// Whole-valued floats become integers when they fit an i64
fn coerce_float(v: f64) -> PropertyValue {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
    if v.fract() == 0.0 && v >= -LIMIT && v < LIMIT {
        PropertyValue::Int(v as i64)
    } else {
        PropertyValue::Double(v)
    }
}

impl RawValue {
    /// Typed form of the value, or `None` for an unset entry.
    pub fn to_property(&self) -> Option<PropertyValue> {
        let value = match self {
            RawValue::String(s) => PropertyValue::String(s.clone()),
            RawValue::Float(f) => coerce_float(*f as f64),
            RawValue::Double(d) => coerce_float(*d),
            RawValue::Int(i) | RawValue::SInt(i) => PropertyValue::Int(*i),
            RawValue::UInt(u) => PropertyValue::UInt(*u),
            RawValue::Bool(b) => PropertyValue::Bool(*b),
            RawValue::Unset => return None,
        };
        Some(value)
    }
}

/// Resolve a feature's tag list against the layer's key and value tables.
///
/// `tags` holds `(key index, value index)` pairs flattened; a trailing
/// unpaired index is ignored. A repeated key keeps its first position and
/// takes the later value.
pub fn map_properties(tags: &[u32], keys: &[String], values: &[RawValue]) -> Result<PropertyMap> {
    let mut properties = PropertyMap::new();
    map_properties_into(&mut properties, tags, keys, values)?;
    Ok(properties)
}

/// Like [`map_properties`], inserting into an existing map.
pub fn map_properties_into(
    properties: &mut PropertyMap,
    tags: &[u32],
    keys: &[String],
    values: &[RawValue],
) -> Result<()> {
    for pair in tags.chunks_exact(2) {
        let (key_index, value_index) = (pair[0], pair[1]);

        let key = keys
            .get(key_index as usize)
            .ok_or(DecodeError::KeyIndexOutOfRange {
                index: key_index,
                len: keys.len(),
            })?;
        let value = values
            .get(value_index as usize)
            .ok_or(DecodeError::ValueIndexOutOfRange {
                index: value_index,
                len: values.len(),
            })?;

        if let Some(value) = value.to_property() {
            properties.insert(key.clone(), value);
        }
    }
    Ok(())
}
