//! Integer geometry primitives, all in nanometers.
//!
//! Coordinates are signed 64-bit so a full reticle at 1 nm resolution fits
//! with room to spare. Rectangles are axis-aligned with `ll ≤ ur` expected;
//! orientation transforms are exact integer mappings.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// A point (or size) in nanometers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord64 {
    /// x coordinate in nm.
    pub x: i64,
    /// y coordinate in nm.
    pub y: i64,
}

/// Alias used when a [`Coord64`] denotes a width/height pair.
pub type Size64 = Coord64;

impl Coord64 {
    /// Creates a new coordinate.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Rectilinear length from the origin to this point.
    pub fn manhattan_length(self) -> i64 {
        self.x.abs() + self.y.abs()
    }

    /// Rectilinear distance between two points.
    pub fn manhattan_distance(self, rhs: Self) -> i64 {
        (self.x - rhs.x).abs() + (self.y - rhs.y).abs()
    }

    /// Returns `true` when both components are zero.
    ///
    /// Used by the placer to detect an unset minimum cell size.
    pub const fn is_null_size(self) -> bool {
        self.x == 0 && self.y == 0
    }
}

impl Add for Coord64 {
    type Output = Coord64;
    fn add(self, rhs: Coord64) -> Coord64 {
        Coord64::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Coord64 {
    type Output = Coord64;
    fn sub(self, rhs: Coord64) -> Coord64 {
        Coord64::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl AddAssign for Coord64 {
    fn add_assign(&mut self, rhs: Coord64) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Coord64 {
    fn sub_assign(&mut self, rhs: Coord64) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for Coord64 {
    type Output = Coord64;
    fn neg(self) -> Coord64 {
        Coord64::new(-self.x, -self.y)
    }
}

/// Margins around a rectangle, in nm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins64 {
    /// Top margin in nm.
    pub top: i64,
    /// Bottom margin in nm.
    pub bottom: i64,
    /// Left margin in nm.
    pub left: i64,
    /// Right margin in nm.
    pub right: i64,
}

impl Margins64 {
    /// Creates a margin set.
    pub const fn new(top: i64, bottom: i64, left: i64, right: i64) -> Self {
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Returns `true` when all four margins are zero.
    pub const fn is_null(self) -> bool {
        self.top == 0 && self.bottom == 0 && self.left == 0 && self.right == 0
    }
}

/// An axis-aligned rectangle defined by its lower-left and upper-right corners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect64 {
    /// Lower-left corner.
    pub ll: Coord64,
    /// Upper-right corner.
    pub ur: Coord64,
}

impl Rect64 {
    /// Creates a rectangle from two corners.
    pub const fn new(ll: Coord64, ur: Coord64) -> Self {
        Self { ll, ur }
    }

    /// Left edge x.
    pub const fn left(self) -> i64 {
        self.ll.x
    }

    /// Right edge x.
    pub const fn right(self) -> i64 {
        self.ur.x
    }

    /// Top edge y.
    pub const fn top(self) -> i64 {
        self.ur.y
    }

    /// Bottom edge y.
    pub const fn bottom(self) -> i64 {
        self.ll.y
    }

    /// Width of the rectangle.
    pub const fn width(self) -> i64 {
        self.ur.x - self.ll.x
    }

    /// Height of the rectangle.
    pub const fn height(self) -> i64 {
        self.ur.y - self.ll.y
    }

    /// Size (width, height).
    pub fn size(self) -> Size64 {
        self.ur - self.ll
    }

    /// Lower-left position of the rectangle.
    pub const fn pos(self) -> Coord64 {
        self.ll
    }

    /// Center coordinate (integer division).
    pub const fn center(self) -> Coord64 {
        Coord64::new((self.ll.x + self.ur.x) / 2, (self.ll.y + self.ur.y) / 2)
    }

    /// Sets the upper-right corner so the rectangle has the given size.
    pub fn set_size(&mut self, size: Size64) {
        self.ur = self.ll + size;
    }

    /// Returns the rectangle moved so its lower-left corner is at `p`.
    pub fn moved_to(self, p: Coord64) -> Rect64 {
        let delta = p - self.ll;
        Rect64::new(p, self.ur + delta)
    }

    /// Returns the rectangle translated by `offset`.
    pub fn moved_by(self, offset: Coord64) -> Rect64 {
        Rect64::new(self.ll + offset, self.ur + offset)
    }

    /// Half-open containment test: `ll ≤ p < ur`.
    pub fn contains(self, p: Coord64) -> bool {
        p.x >= self.ll.x && p.x < self.ur.x && p.y >= self.ll.y && p.y < self.ur.y
    }

    /// Intersection of two rectangles. Degenerate (zero-area) overlaps
    /// return `None`.
    pub fn intersect(self, other: Rect64) -> Option<Rect64> {
        if self.ll.x <= other.ur.x
            && self.ur.x >= other.ll.x
            && self.ll.y <= other.ur.y
            && self.ur.y >= other.ll.y
        {
            let ll = Coord64::new(self.ll.x.max(other.ll.x), self.ll.y.max(other.ll.y));
            let ur = Coord64::new(self.ur.x.min(other.ur.x), self.ur.y.min(other.ur.y));
            if ll.x == ur.x || ll.y == ur.y {
                return None;
            }
            Some(Rect64::new(ll, ur))
        } else {
            None
        }
    }

    /// Returns the rectangle grown outward by the given margins.
    pub fn expanded(self, m: Margins64) -> Rect64 {
        Rect64::new(
            Coord64::new(self.ll.x - m.left, self.ll.y - m.bottom),
            Coord64::new(self.ur.x + m.right, self.ur.y + m.top),
        )
    }

    /// Returns the rectangle shrunk inward by the given margins.
    pub fn contracted(self, m: Margins64) -> Rect64 {
        Rect64::new(
            Coord64::new(self.ll.x + m.left, self.ll.y + m.bottom),
            Coord64::new(self.ur.x - m.right, self.ur.y - m.top),
        )
    }
}

/// Placement orientation of a cell instance.
///
/// The mirrored-and-rotated variants follow the LEF/DEF naming: `MX` flips
/// about the x axis, `MY` about the y axis, `MX90`/`MY90` mirror first and
/// rotate by 90 degrees after.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Orientation {
    /// No rotation (DEF `N`).
    #[default]
    R0,
    /// 90 degrees counter-clockwise (DEF `W`).
    R90,
    /// 180 degrees (DEF `S`).
    R180,
    /// 270 degrees counter-clockwise (DEF `E`).
    R270,
    /// Mirrored about the x axis (DEF `FS`).
    MX,
    /// Mirrored about the x axis, then rotated 90 (DEF `FW`).
    MX90,
    /// Mirrored about the y axis (DEF `FN`).
    MY,
    /// Mirrored about the y axis, then rotated 90 (DEF `FE`).
    MY90,
}

impl Orientation {
    /// Applies the orientation transform to a point around the origin.
    ///
    /// All mappings are exact: `R90(x,y) = (-y,x)`, `R180(x,y) = (-x,-y)`,
    /// `R270(x,y) = (y,-x)`.
    pub fn apply(self, p: Coord64) -> Coord64 {
        match self {
            Orientation::R0 => p,
            Orientation::R90 => Coord64::new(-p.y, p.x),
            Orientation::R180 => Coord64::new(-p.x, -p.y),
            Orientation::R270 => Coord64::new(p.y, -p.x),
            Orientation::MX => Coord64::new(p.x, -p.y),
            Orientation::MX90 => Orientation::R90.apply(Coord64::new(p.x, -p.y)),
            Orientation::MY => Coord64::new(-p.x, p.y),
            Orientation::MY90 => Orientation::R90.apply(Coord64::new(-p.x, p.y)),
        }
    }

    /// The canonical name, matching the database string form.
    pub fn name(self) -> &'static str {
        match self {
            Orientation::R0 => "R0",
            Orientation::R90 => "R90",
            Orientation::R180 => "R180",
            Orientation::R270 => "R270",
            Orientation::MX => "MX",
            Orientation::MX90 => "MX90",
            Orientation::MY => "MY",
            Orientation::MY90 => "MY90",
        }
    }
}

impl std::fmt::Display for Coord64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

impl std::fmt::Display for Rect64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} .. {}]", self.ll, self.ur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coord_arithmetic() {
        let a = Coord64::new(3, 4);
        let b = Coord64::new(1, -2);
        assert_eq!(a + b, Coord64::new(4, 2));
        assert_eq!(a - b, Coord64::new(2, 6));
        assert_eq!(-a, Coord64::new(-3, -4));
        assert_eq!(a.manhattan_length(), 7);
        assert_eq!(a.manhattan_distance(b), 8);
    }

    #[test]
    fn rect_accessors() {
        let r = Rect64::new(Coord64::new(10, 20), Coord64::new(110, 220));
        assert_eq!(r.width(), 100);
        assert_eq!(r.height(), 200);
        assert_eq!(r.left(), 10);
        assert_eq!(r.right(), 110);
        assert_eq!(r.bottom(), 20);
        assert_eq!(r.top(), 220);
        assert_eq!(r.center(), Coord64::new(60, 120));
        assert_eq!(r.size(), Coord64::new(100, 200));
    }

    #[test]
    fn rect_contains_half_open() {
        let r = Rect64::new(Coord64::new(0, 0), Coord64::new(10, 10));
        assert!(r.contains(Coord64::new(0, 0)));
        assert!(r.contains(Coord64::new(9, 9)));
        assert!(!r.contains(Coord64::new(10, 5)));
        assert!(!r.contains(Coord64::new(5, 10)));
        assert!(!r.contains(Coord64::new(-1, 5)));
    }

    #[test]
    fn rect_intersection() {
        let a = Rect64::new(Coord64::new(0, 0), Coord64::new(10, 10));
        let b = Rect64::new(Coord64::new(5, 5), Coord64::new(15, 15));
        let i = a.intersect(b).unwrap();
        assert_eq!(i, Rect64::new(Coord64::new(5, 5), Coord64::new(10, 10)));

        // touching edges have zero area
        let c = Rect64::new(Coord64::new(10, 0), Coord64::new(20, 10));
        assert!(a.intersect(c).is_none());

        let d = Rect64::new(Coord64::new(30, 30), Coord64::new(40, 40));
        assert!(a.intersect(d).is_none());
    }

    #[test]
    fn rect_move_and_margins() {
        let r = Rect64::new(Coord64::new(0, 0), Coord64::new(10, 10));
        let moved = r.moved_to(Coord64::new(5, 5));
        assert_eq!(moved, Rect64::new(Coord64::new(5, 5), Coord64::new(15, 15)));
        let m = Margins64::new(1, 2, 3, 4);
        assert_eq!(
            r.expanded(m),
            Rect64::new(Coord64::new(-3, -2), Coord64::new(14, 11))
        );
        assert_eq!(
            r.contracted(m),
            Rect64::new(Coord64::new(3, 2), Coord64::new(6, 9))
        );
    }

    #[test]
    fn rotations_are_exact() {
        let p = Coord64::new(3, 7);
        assert_eq!(Orientation::R90.apply(p), Coord64::new(-7, 3));
        assert_eq!(Orientation::R180.apply(p), Coord64::new(-3, -7));
        assert_eq!(Orientation::R270.apply(p), Coord64::new(7, -3));
        assert_eq!(Orientation::MX.apply(p), Coord64::new(3, -7));
        assert_eq!(Orientation::MY.apply(p), Coord64::new(-3, 7));
    }

    #[test]
    fn four_quarter_turns_are_identity() {
        let p = Coord64::new(123, -456);
        let mut q = p;
        for _ in 0..4 {
            q = Orientation::R90.apply(q);
        }
        assert_eq!(p, q);
    }

    #[test]
    fn serde_roundtrip() {
        let r = Rect64::new(Coord64::new(1, 2), Coord64::new(3, 4));
        let json = serde_json::to_string(&r).unwrap();
        let back: Rect64 = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }
}
