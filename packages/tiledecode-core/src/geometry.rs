use geo_types::{Coord, Geometry, LineString, MultiLineString, MultiPoint, Point};
use serde::{Deserialize, Serialize};

use crate::boundary::{classify, BoundaryFlags};
use crate::error::{DecodeError, Result};
use crate::ring::{assemble_rings, group_rings};

/// Drawing command of a vector tile geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    MoveTo,
    LineTo,
    ClosePath,
}

/// One step of a geometry's operation stream, in tile-local coordinates.
///
/// `x`/`y` are meaningless for `ClosePath` and are kept at zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OpKind,
    pub x: i64,
    pub y: i64,
}

impl Operation {
    pub fn move_to(x: i64, y: i64) -> Self {
        Operation { kind: OpKind::MoveTo, x, y }
    }

    pub fn line_to(x: i64, y: i64) -> Self {
        Operation { kind: OpKind::LineTo, x, y }
    }

    pub fn close_path() -> Self {
        Operation { kind: OpKind::ClosePath, x: 0, y: 0 }
    }

    pub fn has_coord(&self) -> bool {
        self.kind != OpKind::ClosePath
    }

    pub fn coord(&self) -> Coord<i64> {
        Coord { x: self.x, y: self.y }
    }
}

/// Geometry type tag carried by a raw feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeomKind {
    Point,
    Line,
    Polygon,
    /// Anything else found on the wire, with its raw type number.
    Unknown(i32),
}

/// Rebuild a typed geometry from an operation stream.
///
/// Returns the geometry together with the OR of the boundary flags of every
/// coordinate-bearing point; empty flags mean the geometry lies fully inside
/// the tile.
pub fn build_geometry(
    kind: GeomKind,
    ops: &[Operation],
    extent: i64,
) -> Result<(Geometry<i64>, BoundaryFlags)> {
    let mut flags = BoundaryFlags::WITHIN;

    let geometry = match kind {
        GeomKind::Point => build_points(ops, extent, &mut flags),
        GeomKind::Line => build_lines(ops, extent, &mut flags),
        GeomKind::Polygon => {
            let rings = assemble_rings(ops, extent, &mut flags)?;
            group_rings(rings)?
        }
        GeomKind::Unknown(tag) => return Err(DecodeError::UnsupportedGeometryKind(tag)),
    };

    Ok((geometry, flags))
}

fn build_points(ops: &[Operation], extent: i64, flags: &mut BoundaryFlags) -> Geometry<i64> {
    let coords: Vec<Coord<i64>> = ops
        .iter()
        .filter(|op| op.has_coord())
        .map(Operation::coord)
        .collect();
    for coord in &coords {
        *flags |= classify(*coord, extent);
    }

    if coords.len() == 1 {
        return Geometry::Point(Point::from(coords[0]));
    }
    Geometry::MultiPoint(MultiPoint::new(coords.into_iter().map(Point::from).collect()))
}

fn build_lines(ops: &[Operation], extent: i64, flags: &mut BoundaryFlags) -> Geometry<i64> {
    let move_tos = ops.iter().filter(|op| op.kind == OpKind::MoveTo).count();

    // Each MoveTo after the first opens a new sub-line
    let mut lines: Vec<Vec<Coord<i64>>> = vec![Vec::new()];
    let mut started = false;
    for op in ops.iter().filter(|op| op.has_coord()) {
        if op.kind == OpKind::MoveTo {
            if started {
                lines.push(Vec::new());
            }
            started = true;
        }

        let point = op.coord();
        *flags |= classify(point, extent);
        if let Some(line) = lines.last_mut() {
            line.push(point);
        }
    }

    if move_tos < 2 {
        let points = lines.into_iter().flatten().collect();
        return Geometry::LineString(LineString::new(points));
    }
    Geometry::MultiLineString(MultiLineString::new(
        lines.into_iter().map(LineString::new).collect(),
    ))
}
