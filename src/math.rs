//! Small 2D math types used throughout the rendering core.
//!
//! Sprite positions are subpixel, so everything here is `f32`.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// 2D vector / position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
}

impl Vector {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Vector {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vector {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vector {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vector {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vector {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// 2D extent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sizef {
    pub width: f32,
    pub height: f32,
}

impl Sizef {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Axis-aligned rectangle as top-left corner plus extent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rectf {
    pub pos: Vector,
    pub size: Sizef,
}

impl Rectf {
    pub const fn new(pos: Vector, size: Sizef) -> Self {
        Self { pos, size }
    }

    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(Vector::new(x, y), Sizef::new(width, height))
    }

    pub fn left(&self) -> f32 {
        self.pos.x
    }

    pub fn top(&self) -> f32 {
        self.pos.y
    }

    pub fn right(&self) -> f32 {
        self.pos.x + self.size.width
    }

    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.height
    }

    pub fn contains(&self, point: Vector) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }

    pub fn overlaps(&self, other: &Rectf) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_arithmetic() {
        let a = Vector::new(1.0, 2.0);
        let b = Vector::new(3.0, 5.0);
        assert_eq!(a + b, Vector::new(4.0, 7.0));
        assert_eq!(b - a, Vector::new(2.0, 3.0));
        assert_eq!(a * 2.0, Vector::new(2.0, 4.0));
        assert_eq!(-a, Vector::new(-1.0, -2.0));
    }

    #[test]
    fn vector_assign_ops() {
        let mut v = Vector::new(1.0, 1.0);
        v += Vector::new(2.0, 3.0);
        assert_eq!(v, Vector::new(3.0, 4.0));
        v -= Vector::new(1.0, 1.0);
        assert_eq!(v, Vector::new(2.0, 3.0));
    }

    #[test]
    fn size_empty() {
        assert!(Sizef::new(0.0, 10.0).is_empty());
        assert!(Sizef::new(10.0, -1.0).is_empty());
        assert!(!Sizef::new(1.0, 1.0).is_empty());
    }

    #[test]
    fn rect_edges() {
        let r = Rectf::from_xywh(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.left(), 10.0);
        assert_eq!(r.top(), 20.0);
        assert_eq!(r.right(), 40.0);
        assert_eq!(r.bottom(), 60.0);
    }

    #[test]
    fn rect_contains() {
        let r = Rectf::from_xywh(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Vector::new(5.0, 5.0)));
        assert!(!r.contains(Vector::new(10.0, 5.0)));
    }

    #[test]
    fn rect_overlap() {
        let a = Rectf::from_xywh(0.0, 0.0, 10.0, 10.0);
        let b = Rectf::from_xywh(5.0, 5.0, 10.0, 10.0);
        let c = Rectf::from_xywh(20.0, 20.0, 5.0, 5.0);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
