// Segment and tile-edge intersection math.
//
// Nothing in the decode path calls these yet; they are the building blocks for
// matching remainder features across neighbouring tiles.

use geo_types::Coord;

use crate::boundary::BoundaryFlags;

/// One of the four boundary lines of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    /// `y = 0`
    North,
    /// `y = extent - 1`
    South,
    /// `x = extent - 1`
    East,
    /// `x = 0`
    West,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::North, Edge::South, Edge::East, Edge::West];

    /// The boundary flag set by points lying beyond this edge.
    pub fn flag(self) -> BoundaryFlags {
        match self {
            Edge::North => BoundaryFlags::NORTH,
            Edge::South => BoundaryFlags::SOUTH,
            Edge::East => BoundaryFlags::EAST,
            Edge::West => BoundaryFlags::WEST,
        }
    }

    fn is_horizontal(self) -> bool {
        matches!(self, Edge::North | Edge::South)
    }

    // Fixed coordinate of the boundary line (y for N/S, x for E/W).
    fn fixed_value(self, extent: i64) -> i64 {
        match self {
            Edge::North | Edge::West => 0,
            Edge::South | Edge::East => extent - 1,
        }
    }

    fn endpoints(self, extent: i64) -> (Coord<i64>, Coord<i64>) {
        let v = self.fixed_value(extent);
        if self.is_horizontal() {
            (Coord { x: 0, y: v }, Coord { x: extent - 1, y: v })
        } else {
            (Coord { x: v, y: 0 }, Coord { x: v, y: extent - 1 })
        }
    }
}

/// Outcome of testing a segment against a tile edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeIntersection {
    /// The segment never meets the edge inside the tile.
    NoIntersect,
    /// The segment runs along the edge.
    Coincident,
    /// The segment crosses the edge at this (rounded) point.
    Intersect(Coord<i64>),
}

/// Intersection of the infinite lines through `p1→p2` and `p3→p4`.
///
/// Returns `None` when the lines are parallel or collinear (zero determinant).
pub fn intersect_segments(
    p1: Coord<i64>,
    p2: Coord<i64>,
    p3: Coord<i64>,
    p4: Coord<i64>,
) -> Option<(f64, f64)> {
    let (x1, y1) = (p1.x as f64, p1.y as f64);
    let (x2, y2) = (p2.x as f64, p2.y as f64);
    let (x3, y3) = (p3.x as f64, p3.y as f64);
    let (x4, y4) = (p4.x as f64, p4.y as f64);

    let det = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
    if det == 0.0 {
        return None;
    }

    let a = x1 * y2 - y1 * x2;
    let b = x3 * y4 - y3 * x4;
    let x = (a * (x3 - x4) - (x1 - x2) * b) / det;
    let y = (a * (y3 - y4) - (y1 - y2) * b) / det;
    Some((x, y))
}

fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

/// Test segment `p1→p2` against one boundary line of a tile of size `extent`.
pub fn edge_intercept(edge: Edge, p1: Coord<i64>, p2: Coord<i64>, extent: i64) -> EdgeIntersection {
    let fixed = edge.fixed_value(extent);

    // Parallel to the edge: either on it or never touching it
    let parallel = if edge.is_horizontal() {
        p1.y == p2.y
    } else {
        p1.x == p2.x
    };
    if parallel {
        let on_edge = if edge.is_horizontal() {
            p1.y == fixed
        } else {
            p1.x == fixed
        };
        return if on_edge {
            EdgeIntersection::Coincident
        } else {
            EdgeIntersection::NoIntersect
        };
    }

    let (e1, e2) = edge.endpoints(extent);
    let (x, y) = match intersect_segments(p1, p2, e1, e2) {
        Some(hit) => hit,
        None => return EdgeIntersection::NoIntersect,
    };

    let (along, across) = if edge.is_horizontal() { (x, y) } else { (y, x) };
    if along < 0.0 || along >= extent as f64 {
        return EdgeIntersection::NoIntersect;
    }
    if round_half_up(across) != fixed {
        return EdgeIntersection::NoIntersect;
    }

    EdgeIntersection::Intersect(Coord {
        x: round_half_up(x),
        y: round_half_up(y),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i64, y: i64) -> Coord<i64> {
        Coord { x, y }
    }

    #[test]
    fn segment_along_north_edge_is_coincident() {
        assert_eq!(
            edge_intercept(Edge::North, c(0, 0), c(4095, 0), 4096),
            EdgeIntersection::Coincident
        );
    }

    #[test]
    fn diagonal_crosses_north_edge_at_origin() {
        assert_eq!(
            edge_intercept(Edge::North, c(-5, -5), c(5, 5), 4096),
            EdgeIntersection::Intersect(c(0, 0))
        );
    }

    #[test]
    fn segment_is_extended_to_reach_the_edge() {
        // (10,10)→(20,20) never reaches y = 0, its line does at the origin
        assert_eq!(
            edge_intercept(Edge::North, c(10, 10), c(20, 20), 4096),
            EdgeIntersection::Intersect(c(0, 0))
        );
    }

    #[test]
    fn parallel_off_edge_never_intersects() {
        assert_eq!(
            edge_intercept(Edge::North, c(0, 10), c(100, 10), 4096),
            EdgeIntersection::NoIntersect
        );
        assert_eq!(
            edge_intercept(Edge::East, c(10, 0), c(10, 100), 4096),
            EdgeIntersection::NoIntersect
        );
    }

    #[test]
    fn vertical_segment_on_east_edge_is_coincident() {
        assert_eq!(
            edge_intercept(Edge::East, c(4095, -10), c(4095, 10), 4096),
            EdgeIntersection::Coincident
        );
    }

    #[test]
    fn crossing_outside_tile_span_is_rejected() {
        // Meets y = 0 at x = -100
        assert_eq!(
            edge_intercept(Edge::North, c(-110, -10), c(-90, 10), 4096),
            EdgeIntersection::NoIntersect
        );
        // Meets y = 0 at x = 4096, one past the last column
        assert_eq!(
            edge_intercept(Edge::North, c(4086, -10), c(4106, 10), 4096),
            EdgeIntersection::NoIntersect
        );
    }

    #[test]
    fn crossing_rounds_to_nearest() {
        // Meets x = 4095 at y = 2047.5
        assert_eq!(
            edge_intercept(Edge::East, c(4094, 2047), c(4096, 2048), 4096),
            EdgeIntersection::Intersect(c(4095, 2048))
        );
        // Meets y = 99 at x = 10.25
        assert_eq!(
            edge_intercept(Edge::South, c(10, 98), c(11, 102), 100),
            EdgeIntersection::Intersect(c(10, 99))
        );
    }

    #[test]
    fn crossing_west_and_south() {
        assert_eq!(
            edge_intercept(Edge::West, c(-10, 50), c(10, 50), 100),
            EdgeIntersection::Intersect(c(0, 50))
        );
        assert_eq!(
            edge_intercept(Edge::South, c(20, 90), c(20, 120), 100),
            EdgeIntersection::Intersect(c(20, 99))
        );
    }

    #[test]
    fn parallel_lines_have_no_intersection_point() {
        assert_eq!(intersect_segments(c(0, 0), c(10, 10), c(0, 5), c(10, 15)), None);
        assert_eq!(intersect_segments(c(0, 0), c(10, 10), c(20, 20), c(30, 30)), None);
        assert_eq!(
            intersect_segments(c(0, 0), c(10, 10), c(0, 10), c(10, 0)),
            Some((5.0, 5.0))
        );
    }

    #[test]
    fn edge_flags() {
        assert_eq!(Edge::North.flag(), BoundaryFlags::NORTH);
        assert_eq!(Edge::West.flag(), BoundaryFlags::WEST);
    }
}
