use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default, Display, Serialize, Deserialize)]
#[display("({x}, {y})")]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// A sample is usable only if both coordinates are finite.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Display, Serialize, Deserialize)]
#[display("{width}x{height}")]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned box given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Display, Serialize, Deserialize)]
#[display("[{x}, {y}, {width}x{height}]")]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn top_left(&self) -> Point {
        self.origin()
    }

    pub fn top_right(&self) -> Point {
        Point::new(self.right(), self.top())
    }

    pub fn bottom_left(&self) -> Point {
        Point::new(self.left(), self.bottom())
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.right(), self.bottom())
    }

    /// Finite coordinates and a non-negative size.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.left() && x <= self.right()
    }

    pub fn translate(&self, by: Point) -> Rect {
        Rect::new(self.x + by.x, self.y + by.y, self.width, self.height)
    }

    /// Shrinks the box by `insets`. The result never has a negative size.
    pub fn inset(&self, insets: Insets) -> Rect {
        let width = (self.width - insets.left - insets.right).max(0.0);
        let height = (self.height - insets.top - insets.bottom).max(0.0);
        Rect::new(self.x + insets.left, self.y + insets.top, width, height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Insets {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Insets {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn symmetric(horizontal: f32, vertical: f32) -> Self {
        Self::new(horizontal, vertical, horizontal, vertical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_inclusive() {
        let r = Rect::new(10.0, 20.0, 100.0, 48.0);
        assert!(r.contains(Point::new(10.0, 20.0)));
        assert!(r.contains(Point::new(110.0, 68.0)));
        assert!(!r.contains(Point::new(110.1, 30.0)));
        assert!(!r.contains(Point::new(50.0, 19.9)));
    }

    #[test]
    fn test_validity() {
        assert!(Point::new(1.0, 2.0).is_valid());
        assert!(!Point::new(f32::NAN, 2.0).is_valid());
        assert!(!Point::new(0.0, f32::INFINITY).is_valid());
        assert!(!Rect::new(0.0, 0.0, -1.0, 10.0).is_valid());
        assert!(Rect::new(0.0, 0.0, 0.0, 0.0).is_valid());
    }

    #[test]
    fn test_inset_never_goes_negative() {
        let r = Rect::new(0.0, 0.0, 40.0, 20.0).inset(Insets::symmetric(24.0, 16.0));
        assert_eq!(r, Rect::new(24.0, 16.0, 0.0, 0.0));

        let r = Rect::new(5.0, 5.0, 200.0, 100.0).inset(Insets::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(r, Rect::new(6.0, 7.0, 196.0, 94.0));
    }

    #[test]
    fn test_insets_default_missing_fields() {
        let insets: Insets = serde_json::from_str(r#"{"top": 16.0}"#).unwrap();
        assert_eq!(insets, Insets::new(0.0, 16.0, 0.0, 0.0));
    }
}
