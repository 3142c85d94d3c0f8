use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use geo_types::Coord;
use serde::{Deserialize, Serialize};

/// Set of tile edges a point (or geometry) lies beyond.
///
/// An empty set means the point is inside `[0, extent)` on both axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundaryFlags(u8);

impl BoundaryFlags {
    pub const WITHIN: BoundaryFlags = BoundaryFlags(0);
    pub const NORTH: BoundaryFlags = BoundaryFlags(0x01);
    pub const SOUTH: BoundaryFlags = BoundaryFlags(0x02);
    pub const EAST: BoundaryFlags = BoundaryFlags(0x04);
    pub const WEST: BoundaryFlags = BoundaryFlags(0x08);

    /// Rebuild flags from their integer form, dropping unknown bits.
    pub fn from_bits(bits: u64) -> Self {
        BoundaryFlags((bits & 0x0f) as u8)
    }

    pub fn bits(self) -> u64 {
        self.0 as u64
    }

    pub fn is_within(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: BoundaryFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for BoundaryFlags {
    type Output = BoundaryFlags;

    fn bitor(self, rhs: BoundaryFlags) -> BoundaryFlags {
        BoundaryFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for BoundaryFlags {
    fn bitor_assign(&mut self, rhs: BoundaryFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for BoundaryFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&describe(*self))
    }
}

/// Which tile edges `point` lies beyond, for a tile of the given extent.
///
/// At most one horizontal and one vertical flag can be set.
pub fn classify(point: Coord<i64>, extent: i64) -> BoundaryFlags {
    let mut flags = BoundaryFlags::WITHIN;
    if point.x < 0 {
        flags |= BoundaryFlags::WEST;
    } else if point.x >= extent {
        flags |= BoundaryFlags::EAST;
    }
    if point.y < 0 {
        flags |= BoundaryFlags::NORTH;
    } else if point.y >= extent {
        flags |= BoundaryFlags::SOUTH;
    }
    flags
}

/// Human readable flag names, e.g. `"North|East"`, or `"On Tile"` when empty.
pub fn describe(flags: BoundaryFlags) -> String {
    if flags.is_within() {
        return "On Tile".to_string();
    }

    let names = [
        (BoundaryFlags::NORTH, "North"),
        (BoundaryFlags::SOUTH, "South"),
        (BoundaryFlags::EAST, "East"),
        (BoundaryFlags::WEST, "West"),
    ];
    names
        .iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join("|")
}
