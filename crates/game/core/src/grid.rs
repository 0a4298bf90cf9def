//! Hex grid geometry.
//!
//! Areas are laid out as flat-topped hexes in "odd column" offset coordinates:
//! every odd column is shifted half a tile down. Distances, rings and lines are
//! computed in cube coordinates and converted back.

use std::fmt;

/// Discrete grid position expressed in tile coordinates (column, row).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    fn to_cube(self) -> Cube {
        Cube {
            q: self.x,
            r: self.y - (self.x - (self.x & 1)) / 2,
        }
    }

    /// Number of hex steps between two positions.
    pub fn distance(self, other: Position) -> u32 {
        self.to_cube().distance(other.to_cube())
    }

    /// The six adjacent positions, unclipped.
    pub fn neighbors(self) -> [Position; 6] {
        let cube = self.to_cube();
        CUBE_DIRECTIONS.map(|dir| cube.offset(dir, 1).to_position())
    }

    /// All positions at exactly `radius` steps, walked clockwise.
    ///
    /// A radius of zero yields the position itself.
    pub fn ring(self, radius: u32) -> Vec<Position> {
        if radius == 0 {
            return vec![self];
        }

        let radius = radius as i32;
        let mut points = Vec::with_capacity(6 * radius as usize);
        let mut cube = self.to_cube().offset(CUBE_DIRECTIONS[4], radius);
        for dir in CUBE_DIRECTIONS {
            for _ in 0..radius {
                points.push(cube.to_position());
                cube = cube.offset(dir, 1);
            }
        }
        points
    }

    /// Sweeps rings outward from `min_radius` to `max_radius` inclusive.
    pub fn rings(self, min_radius: u32, max_radius: u32) -> Vec<Position> {
        (min_radius..=max_radius)
            .flat_map(|radius| self.ring(radius))
            .collect()
    }

    /// Hex line from `self` to `other`, both endpoints included.
    pub fn line_to(self, other: Position) -> Vec<Position> {
        let steps = self.distance(other);
        let start = FractionalHex::from(self.to_cube()).nudge();
        let end = FractionalHex::from(other.to_cube()).nudge();

        if steps == 0 {
            return vec![self];
        }

        (0..=steps)
            .map(|step| start.lerp(end, step as f32 / steps as f32).round())
            .collect()
    }

    /// Center of this tile in screen space for the given hex size.
    pub fn screen_center(self, tile_size: f32) -> (f32, f32) {
        let cube = self.to_cube();
        let q = cube.q as f32;
        let r = cube.r as f32;
        (
            tile_size * 1.5 * q,
            tile_size * SQRT_3 * (r + q / 2.0),
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

const SQRT_3: f32 = 1.732_050_8;

const CUBE_DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

/// Axial/cube coordinate; `s` is implied as `-q - r`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cube {
    q: i32,
    r: i32,
}

impl Cube {
    fn offset(self, (dq, dr): (i32, i32), times: i32) -> Self {
        Self {
            q: self.q + dq * times,
            r: self.r + dr * times,
        }
    }

    fn distance(self, other: Cube) -> u32 {
        let dq = self.q - other.q;
        let dr = self.r - other.r;
        ((dq.abs() + dr.abs() + (dq + dr).abs()) / 2) as u32
    }

    fn to_position(self) -> Position {
        Position {
            x: self.q,
            y: self.r + (self.q - (self.q & 1)) / 2,
        }
    }
}

/// A point in continuous hex space, used for lines and screen conversions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FractionalHex {
    q: f32,
    r: f32,
}

impl FractionalHex {
    /// Converts a screen-space point to fractional hex coordinates.
    pub fn from_screen(x: f32, y: f32, tile_size: f32) -> Self {
        Self {
            q: (2.0 / 3.0 * x) / tile_size,
            r: (-1.0 / 3.0 * x + SQRT_3 / 3.0 * y) / tile_size,
        }
    }

    pub fn from_position(position: Position) -> Self {
        Self::from(position.to_cube())
    }

    fn nudge(self) -> Self {
        Self {
            q: self.q + 1e-4,
            r: self.r + 1e-4,
        }
    }

    pub fn lerp(self, other: FractionalHex, t: f32) -> Self {
        Self {
            q: self.q + (other.q - self.q) * t,
            r: self.r + (other.r - self.r) * t,
        }
    }

    /// Hex distance in continuous space.
    pub fn distance(self, other: FractionalHex) -> f32 {
        let dq = self.q - other.q;
        let dr = self.r - other.r;
        (dq.abs() + dr.abs() + (dq + dr).abs()) / 2.0
    }

    /// Rounds to the nearest tile.
    pub fn round(self) -> Position {
        let s = -self.q - self.r;
        let mut q = self.q.round();
        let mut r = self.r.round();
        let rs = s.round();

        let dq = (q - self.q).abs();
        let dr = (r - self.r).abs();
        let ds = (rs - s).abs();

        if dq > dr && dq > ds {
            q = -r - rs;
        } else if dr > ds {
            r = -q - rs;
        }

        Cube {
            q: q as i32,
            r: r as i32,
        }
        .to_position()
    }
}

impl From<Cube> for FractionalHex {
    fn from(cube: Cube) -> Self {
        Self {
            q: cube.q as f32,
            r: cube.r as f32,
        }
    }
}

/// Bounds of an area in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaDimensions {
    pub width: u32,
    pub height: u32,
}

impl AreaDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0
            && position.y >= 0
            && position.x < self.width as i32
            && position.y < self.height as i32
    }

    /// Row-major index of an in-bounds position.
    pub fn index(&self, position: Position) -> Option<usize> {
        self.contains(position)
            .then(|| position.y as usize * self.width as usize + position.x as usize)
    }

    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Upper bound on the hex distance between two in-bounds tiles.
    pub fn diagonal(&self) -> u32 {
        self.width.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
