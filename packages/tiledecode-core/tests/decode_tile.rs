use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use geo_types::{Coord, Geometry, LineString};
use geozero::mvt::tile::{self, GeomType};
use geozero::mvt::{Message, Tile};
use serde_json::Value;

use tiledecode_core::geojson::GeoJsonSink;
use tiledecode_core::{
    BoundaryFlags, DecodeConfig, DecodeError, InvalidFeaturePolicy, MemoryTileStore, PropertyValue,
    TileCoord, TileDecoder,
};

fn command(id: u32, count: u32) -> u32 {
    (count << 3) | id
}

fn param(v: i32) -> u32 {
    ((v << 1) ^ (v >> 31)) as u32
}

// Encode absolute paths; the cursor carries over from one path to the next
fn encode(paths: &[&[(i32, i32)]], close: bool) -> Vec<u32> {
    let mut out = Vec::new();
    let (mut cx, mut cy) = (0, 0);
    for points in paths {
        for (i, &(x, y)) in points.iter().enumerate() {
            if i == 0 {
                out.push(command(1, 1));
            } else if i == 1 {
                out.push(command(2, points.len() as u32 - 1));
            }
            out.push(param(x - cx));
            out.push(param(y - cy));
            cx = x;
            cy = y;
        }
        if close {
            out.push(command(7, 1));
        }
    }
    out
}

fn feature(id: u64, kind: GeomType, geometry: Vec<u32>, tags: Vec<u32>) -> tile::Feature {
    tile::Feature {
        id: Some(id),
        tags,
        r#type: Some(kind as i32),
        geometry,
        ..Default::default()
    }
}

fn string_value(s: &str) -> tile::Value {
    tile::Value {
        string_value: Some(s.to_string()),
        ..Default::default()
    }
}

fn sample_tile() -> Tile {
    // Outer, hole, outer: areas +1000, -50, +700
    let multipolygon = encode(
        &[
            &[(0, 0), (50, 0), (50, 20), (0, 20)],
            &[(10, 10), (10, 15), (20, 15), (20, 10)],
            &[(100, 100), (170, 100), (170, 110), (100, 110)],
        ],
        true,
    );

    let roads = tile::Layer {
        version: 2,
        name: "roads".to_string(),
        keys: vec!["class".to_string(), "lanes".to_string()],
        values: vec![
            string_value("primary"),
            tile::Value {
                double_value: Some(2.0),
                ..Default::default()
            },
        ],
        features: vec![
            feature(
                1,
                GeomType::Linestring,
                encode(&[&[(10, 10), (20, 20)]], false),
                vec![0, 0, 1, 1],
            ),
            feature(
                2,
                GeomType::Linestring,
                encode(&[&[(4000, 10), (4200, 10)]], false),
                vec![0, 0],
            ),
        ],
        extent: Some(4096),
        ..Default::default()
    };

    let buildings = tile::Layer {
        version: 2,
        name: "buildings".to_string(),
        keys: vec![],
        values: vec![],
        features: vec![feature(3, GeomType::Polygon, multipolygon, vec![])],
        extent: Some(4096),
        ..Default::default()
    };

    let water = tile::Layer {
        version: 2,
        name: "water".to_string(),
        features: vec![feature(4, GeomType::Point, encode(&[&[(-5, 5)]], false), vec![])],
        extent: Some(4096),
        ..Default::default()
    };

    Tile {
        layers: vec![roads, buildings, water],
    }
}

fn gzipped(tile: &Tile) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&tile.encode_to_vec()).unwrap();
    encoder.finish().unwrap()
}

fn store_with_sample(coord: TileCoord) -> MemoryTileStore {
    let mut store = MemoryTileStore::new();
    store.insert_tms(coord.z, coord.x, coord.tms_row(), gzipped(&sample_tile()));
    store
}

#[test]
fn decodes_gzipped_tile_from_store() {
    let coord = TileCoord::new(14, 8190, 5447);
    let store = store_with_sample(coord);
    let decoder = TileDecoder::new(DecodeConfig::default());

    let tile = decoder.decode_from_store(&store, coord).unwrap();
    assert!(tile.compressed);
    assert_eq!(tile.layers.len(), 3);

    let roads = tile.layer("roads").unwrap();
    assert_eq!(roads.extent, 4096);
    assert_eq!(
        roads.features[0].geometry,
        Geometry::LineString(LineString::new(vec![Coord { x: 10, y: 10 }, Coord { x: 20, y: 20 }]))
    );
    assert_eq!(roads.features[0].properties["lanes"], PropertyValue::Int(2));
    assert_eq!(roads.features[1].offtile, BoundaryFlags::EAST);

    let buildings = tile.layer("buildings").unwrap();
    match &buildings.features[0].geometry {
        Geometry::MultiPolygon(mp) => {
            assert_eq!(mp.0.len(), 2);
            assert_eq!(mp.0[0].interiors().len(), 1);
            assert_eq!(mp.0[0].interiors()[0].0[0], Coord { x: 10, y: 10 });
            assert_eq!(mp.0[1].exterior().0[0], Coord { x: 100, y: 100 });
        }
        other => panic!("expected multipolygon, got {:?}", other),
    }
}

#[test]
fn merge_pass_emits_inside_and_returns_remainders() {
    let coord = TileCoord::new(14, 8190, 5447);
    let store = store_with_sample(coord);
    let decoder = TileDecoder::new(DecodeConfig::default().with_layers(["roads", "buildings"]));

    let mut sink = GeoJsonSink::new(Vec::new());
    let remainders = decoder.load_feature_map(&store, coord, &mut sink).unwrap();
    assert_eq!(sink.written(), 2);

    let json: Value = serde_json::from_slice(&sink.finish().unwrap()).unwrap();
    let ids: Vec<u64> = json["features"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["id"].as_u64())
        .collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(json["features"][0]["properties"]["offtile"], 0);

    assert_eq!(remainders.len(), 2);
    assert_eq!(remainders["roads"].len(), 1);
    assert_eq!(remainders["roads"][0].id, Some(2));
    assert!(remainders["buildings"].is_empty());
    assert!(!remainders.contains_key("water"));
}

#[test]
fn stats_count_geometry_kinds() {
    let coord = TileCoord::new(3, 2, 1);
    let data = gzipped(&sample_tile());
    let decoder = TileDecoder::new(DecodeConfig::default());

    let stats = decoder.tile_stats(coord, &data).unwrap();
    assert!(stats.compressed);
    assert_eq!(stats.bytes, data.len());
    assert_eq!(stats.layers[0].lines, 2);
    assert_eq!(stats.layers[1].polygons, 1);
    assert_eq!(stats.layers[2].points, 1);

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["layers"][0]["name"], "roads");
}

#[test]
fn bad_tag_fails_the_tile_unless_skipped() {
    let mut tile = sample_tile();
    tile.layers[0].features[0].tags = vec![0, 99];
    let data = tile.encode_to_vec();
    let coord = TileCoord::new(5, 1, 1);

    let strict = TileDecoder::new(DecodeConfig::default());
    let err = strict.decode_tile(coord, &data).unwrap_err();
    assert!(err.to_string().starts_with("tile 5/1/1:"));
    assert!(matches!(
        err.root_cause(),
        DecodeError::ValueIndexOutOfRange { index: 99, len: 2 }
    ));

    let lenient = TileDecoder::new(
        DecodeConfig::default().with_invalid_feature(InvalidFeaturePolicy::Skip),
    );
    let decoded = lenient.decode_tile(coord, &data).unwrap();
    assert_eq!(decoded.skipped(), 1);
    assert_eq!(decoded.layer("roads").unwrap().features.len(), 1);
    assert!(!decoded.compressed);
}

#[test]
fn range_decoding_respects_zoom_bounds() {
    let mut store = MemoryTileStore::new();
    let data = gzipped(&sample_tile());
    store.insert(TileCoord::new(1, 0, 0), data.clone());
    store.insert(TileCoord::new(2, 3, 1), data.clone());
    store.insert(TileCoord::new(4, 0, 0), data);

    let config = DecodeConfig::default()
        .with_zoom_range(1, 2)
        .with_layers(["water"]);
    let decoder = TileDecoder::new(config);
    let tiles = decoder.decode_range(&store).unwrap();
    let coords: Vec<TileCoord> = tiles.iter().map(|t| t.coord).collect();
    assert_eq!(coords, vec![TileCoord::new(1, 0, 0), TileCoord::new(2, 3, 1)]);
    assert!(tiles.iter().all(|t| t.layers.len() == 1));
    assert_eq!(tiles[0].layers[0].features[0].offtile, BoundaryFlags::WEST);
}
