// GeoJSON rendering of decoded features. Coordinates stay tile-local integers.

use std::io::Write;

use geo_types::{Coord, Geometry, LineString, Polygon};
use serde_json::{json, Map, Number, Value};

use crate::error::Result;
use crate::feature::{Feature, Layer};
use crate::partition::FeatureSink;
use crate::properties::{PropertyMap, PropertyValue};

fn coord_json(c: &Coord<i64>) -> Value {
    json!([c.x, c.y])
}

fn line_json(line: &LineString<i64>) -> Value {
    Value::Array(line.0.iter().map(coord_json).collect())
}

fn polygon_json(polygon: &Polygon<i64>) -> Value {
    let rings = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(line_json)
        .collect();
    Value::Array(rings)
}

fn typed(kind: &str, coordinates: Value) -> Value {
    json!({ "type": kind, "coordinates": coordinates })
}

/// GeoJSON geometry object for a tile-local geometry.
pub fn geometry_to_json(geometry: &Geometry<i64>) -> Value {
    match geometry {
        Geometry::Point(p) => typed("Point", coord_json(&p.0)),
        Geometry::MultiPoint(mp) => typed(
            "MultiPoint",
            Value::Array(mp.0.iter().map(|p| coord_json(&p.0)).collect()),
        ),
        Geometry::LineString(line) => typed("LineString", line_json(line)),
        Geometry::MultiLineString(ml) => typed(
            "MultiLineString",
            Value::Array(ml.0.iter().map(line_json).collect()),
        ),
        Geometry::Polygon(polygon) => typed("Polygon", polygon_json(polygon)),
        Geometry::MultiPolygon(mp) => typed(
            "MultiPolygon",
            Value::Array(mp.0.iter().map(polygon_json).collect()),
        ),
        // Never produced by the decoder, rendered through their GeoJSON equivalents
        Geometry::Line(line) => typed(
            "LineString",
            Value::Array(vec![coord_json(&line.start), coord_json(&line.end)]),
        ),
        Geometry::Rect(rect) => typed("Polygon", polygon_json(&rect.to_polygon())),
        Geometry::Triangle(triangle) => typed("Polygon", polygon_json(&triangle.to_polygon())),
        Geometry::GeometryCollection(gc) => json!({
            "type": "GeometryCollection",
            "geometries": gc.0.iter().map(geometry_to_json).collect::<Vec<_>>(),
        }),
    }
}

/// JSON form of a property value. Non-finite doubles become `null`.
pub fn property_to_json(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::String(s) => Value::String(s.clone()),
        PropertyValue::Int(i) => Value::Number(Number::from(*i)),
        PropertyValue::UInt(u) => Value::Number(Number::from(*u)),
        PropertyValue::Bool(b) => Value::Bool(*b),
        PropertyValue::Double(d) => Number::from_f64(*d).map_or(Value::Null, Value::Number),
    }
}

pub fn properties_to_json(properties: &PropertyMap) -> Value {
    let map: Map<String, Value> = properties
        .iter()
        .map(|(k, v)| (k.clone(), property_to_json(v)))
        .collect();
    Value::Object(map)
}

/// GeoJSON `Feature` object.
pub fn feature_to_json(feature: &Feature) -> Value {
    let mut object = Map::new();
    object.insert("type".to_string(), Value::String("Feature".to_string()));
    if let Some(id) = feature.id {
        object.insert("id".to_string(), Value::Number(Number::from(id)));
    }
    object.insert("properties".to_string(), properties_to_json(&feature.properties));
    object.insert("geometry".to_string(), geometry_to_json(&feature.geometry));
    Value::Object(object)
}

/// A layer as a `FeatureCollection` carrying its name, version and extent.
pub fn layer_to_json(layer: &Layer) -> Value {
    json!({
        "type": "FeatureCollection",
        "properties": {
            "layer": layer.name,
            "version": layer.version,
            "extent": layer.extent,
        },
        "features": layer.features.iter().map(feature_to_json).collect::<Vec<_>>(),
    })
}

/// Streams emitted features as one GeoJSON `FeatureCollection`.
pub struct GeoJsonSink<W: Write> {
    writer: W,
    started: bool,
    written: usize,
}

impl<W: Write> GeoJsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            started: false,
            written: 0,
        }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    fn begin(&mut self) -> Result<()> {
        if !self.started {
            self.writer.write_all(b"{ \"type\": \"FeatureCollection\", \"features\": [\n")?;
            self.started = true;
        }
        Ok(())
    }

    /// Close the collection and hand back the writer.
    pub fn finish(mut self) -> Result<W> {
        self.begin()?;
        self.writer.write_all(b"\n] }\n")?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> FeatureSink for GeoJsonSink<W> {
    fn emit(&mut self, feature: &Feature) -> Result<()> {
        self.begin()?;
        if self.written > 0 {
            self.writer.write_all(b",\n")?;
        }
        serde_json::to_writer(&mut self.writer, &feature_to_json(feature))?;
        self.written += 1;
        Ok(())
    }
}
