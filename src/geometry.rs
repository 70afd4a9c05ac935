/// A point in screen or surface coordinates.
pub type Point = (i32, i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right and bottom edges are exclusive.
    pub fn contains(&self, point: Point) -> bool {
        point.0 >= self.x
            && point.0 < self.x + self.width
            && point.1 >= self.y
            && point.1 < self.y + self.height
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }
}

pub fn offset(point: Point, origin: Point) -> Point {
    (point.0 - origin.0, point.1 - origin.1)
}

pub fn translate(point: Point, delta: Point) -> Point {
    (point.0 + delta.0, point.1 + delta.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_region_excludes_right_and_bottom_edges() {
        let rect = Rect::new(249, 0, 45, 29);
        assert!(rect.contains((249, 0)));
        assert!(rect.contains((293, 28)));
        assert!(!rect.contains((294, 10)));
        assert!(!rect.contains((260, 29)));
        assert!(!rect.contains((248, 10)));
        assert_eq!((rect.right(), rect.bottom()), (294, 29));
    }

    #[test]
    fn offset_and_translate_are_inverse() {
        let origin = (100, 100);
        let local = offset((110, 125), origin);
        assert_eq!(local, (10, 25));
        assert_eq!(translate(origin, local), (110, 125));
    }
}
