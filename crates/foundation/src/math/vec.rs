/// Planar pair: projected meters or screen pixels depending on context.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self::new(0.5 * (self.x + other.x), 0.5 * (self.y + other.y))
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

#[cfg(test)]
mod tests {
    use super::Vec2;

    #[test]
    fn extent_and_midpoint() {
        let a = Vec2::new(-2.0, 6.0);
        let b = Vec2::new(4.0, 2.0);
        assert_eq!((a - b).abs(), Vec2::new(6.0, 4.0));
        assert_eq!(a.midpoint(b), Vec2::new(1.0, 4.0));
    }
}
