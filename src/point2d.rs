use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// Integer screen-space coordinate shared by the line and triangle rasterizers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Point2D {
    pub x: i32,
    pub y: i32,
}

impl Point2D {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point2D {
    type Output = Point2D;
    fn add(self, other: Point2D) -> Point2D {
        Point2D { x: self.x + other.x, y: self.y + other.y }
    }
}

impl Add<i32> for Point2D {
    type Output = Point2D;
    fn add(self, scalar: i32) -> Point2D {
        Point2D { x: self.x + scalar, y: self.y + scalar }
    }
}

impl Sub for Point2D {
    type Output = Point2D;
    fn sub(self, other: Point2D) -> Point2D {
        Point2D { x: self.x - other.x, y: self.y - other.y }
    }
}

impl Sub<i32> for Point2D {
    type Output = Point2D;
    fn sub(self, scalar: i32) -> Point2D {
        Point2D { x: self.x - scalar, y: self.y - scalar }
    }
}

impl Mul for Point2D {
    type Output = Point2D;
    fn mul(self, other: Point2D) -> Point2D {
        Point2D { x: self.x * other.x, y: self.y * other.y }
    }
}

impl Mul<i32> for Point2D {
    type Output = Point2D;
    fn mul(self, scalar: i32) -> Point2D {
        Point2D { x: self.x * scalar, y: self.y * scalar }
    }
}

impl Div for Point2D {
    type Output = Point2D;
    fn div(self, other: Point2D) -> Point2D {
        Point2D { x: self.x / other.x, y: self.y / other.y }
    }
}

impl Div<i32> for Point2D {
    type Output = Point2D;
    fn div(self, scalar: i32) -> Point2D {
        Point2D { x: self.x / scalar, y: self.y / scalar }
    }
}

impl fmt::Display for Point2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_is_component_wise() {
        let a = Point2D::new(6, 9);
        let b = Point2D::new(2, 3);
        assert_eq!(a + b, Point2D::new(8, 12));
        assert_eq!(a - b, Point2D::new(4, 6));
        assert_eq!(a * b, Point2D::new(12, 27));
        assert_eq!(a / b, Point2D::new(3, 3));
        assert_eq!(a + 1, Point2D::new(7, 10));
        assert_eq!(a / 3, Point2D::new(2, 3));
    }

    #[test]
    fn display_matches_tuple_form() {
        assert_eq!(Point2D::new(-4, 12).to_string(), "(-4,12)");
    }
}
