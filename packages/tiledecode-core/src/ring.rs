// Ring assembly for polygon features: split the operation stream into closed
// rings, classify each by signed area and group them into polygons.

use geo_types::{Coord, Geometry, LineString, MultiPolygon, Polygon};

use crate::boundary::{classify, BoundaryFlags};
use crate::error::{DecodeError, Result};
use crate::geometry::{OpKind, Operation};

/// Whether a ring bounds a filled region or a hole.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Outer,
    Inner,
}

/// A closed ring: the last point repeats the first.
#[derive(Clone, Debug, PartialEq)]
pub struct Ring {
    points: Vec<Coord<i64>>,
    twice_area: i128,
}

impl Ring {
    fn new(points: Vec<Coord<i64>>) -> Self {
        // The closing point duplicates the first and contributes nothing to the sum
        let open = match (points.first(), points.last()) {
            (Some(first), Some(last)) if points.len() > 1 && first == last => {
                &points[..points.len() - 1]
            }
            _ => &points[..],
        };
        let twice_area = twice_signed_area(open);
        Ring { points, twice_area }
    }

    pub fn points(&self) -> &[Coord<i64>] {
        &self.points
    }

    pub fn area(&self) -> f64 {
        self.twice_area as f64 / 2.0
    }

    pub fn orientation(&self) -> Orientation {
        if self.twice_area >= 0 {
            Orientation::Outer
        } else {
            Orientation::Inner
        }
    }

    fn into_line_string(self) -> LineString<i64> {
        LineString::new(self.points)
    }
}

/// Twice the shoelace area of a ring, including the wrap from last to first.
///
/// Exact: computed in 128-bit integers.
pub fn twice_signed_area(points: &[Coord<i64>]) -> i128 {
    let n = points.len();
    let mut sum: i128 = 0;
    for k in 0..n {
        let a = points[k];
        let b = points[(k + 1) % n];
        sum += a.x as i128 * b.y as i128 - a.y as i128 * b.x as i128;
    }
    sum
}

/// Shoelace signed area; `>= 0` is an outer ring in tile coordinates.
pub fn signed_area(points: &[Coord<i64>]) -> f64 {
    twice_signed_area(points) as f64 / 2.0
}

/// Split a polygon operation stream into closed rings.
///
/// Every coordinate-bearing point is OR-ed into `flags`; the synthetic point a
/// ClosePath appends is not, since it repeats the ring's first point.
pub fn assemble_rings(
    ops: &[Operation],
    extent: i64,
    flags: &mut BoundaryFlags,
) -> Result<Vec<Ring>> {
    let mut runs: Vec<Vec<Coord<i64>>> = Vec::new();

    for (i, op) in ops.iter().enumerate() {
        if op.kind == OpKind::MoveTo {
            runs.push(Vec::new());
        }

        // Anything before the first MoveTo has no ring to attach to
        if let Some(ring) = runs.last_mut() {
            match op.kind {
                OpKind::ClosePath => {
                    if let Some(first) = ring.first().copied() {
                        ring.push(first);
                    }
                }
                OpKind::MoveTo | OpKind::LineTo => {
                    let point = op.coord();
                    *flags |= classify(point, extent);
                    ring.push(point);
                }
            }
        }

        let ends_ring = ops
            .get(i + 1)
            .map_or(true, |next| next.kind == OpKind::MoveTo);
        if ends_ring && op.kind != OpKind::ClosePath {
            return Err(DecodeError::UnterminatedRing { last: op.kind });
        }
    }

    Ok(runs.into_iter().map(Ring::new).collect())
}

/// Group rings into polygons: each outer ring starts a polygon and the inner
/// rings that follow it become its holes.
///
/// More than one outer ring yields a `MultiPolygon`; otherwise the single
/// polygon is returned unwrapped.
pub fn group_rings(rings: Vec<Ring>) -> Result<Geometry<i64>> {
    let mut polygons: Vec<(LineString<i64>, Vec<LineString<i64>>)> = Vec::new();

    for ring in rings {
        match ring.orientation() {
            Orientation::Outer => polygons.push((ring.into_line_string(), Vec::new())),
            Orientation::Inner => match polygons.last_mut() {
                Some((_, holes)) => holes.push(ring.into_line_string()),
                None => return Err(DecodeError::InvalidPolygonStart { area: ring.area() }),
            },
        }
    }

    let mut polygons: Vec<Polygon<i64>> = polygons
        .into_iter()
        .map(|(exterior, holes)| Polygon::new(exterior, holes))
        .collect();

    if polygons.len() > 1 {
        return Ok(Geometry::MultiPolygon(MultiPolygon::new(polygons)));
    }
    let polygon = polygons
        .pop()
        .unwrap_or_else(|| Polygon::new(LineString::new(Vec::new()), Vec::new()));
    Ok(Geometry::Polygon(polygon))
}
