/// A WGS84 position in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoPoint {
    pub lat_deg: f64,
    pub lon_deg: f64,
}

impl GeoPoint {
    pub const fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }
}

/// Latitude/longitude aligned bounding box.
///
/// The default value is the empty box: it contains nothing and `is_valid()`
/// returns false until at least one point has been added.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::empty()
    }
}

impl GeoBounds {
    pub const fn empty() -> Self {
        Self {
            south: f64::INFINITY,
            west: f64::INFINITY,
            north: f64::NEG_INFINITY,
            east: f64::NEG_INFINITY,
        }
    }

    /// Builds the box spanned by two corners given in any order.
    pub fn from_corners(a: GeoPoint, b: GeoPoint) -> Self {
        let mut out = Self::empty();
        out.extend(a);
        out.extend(b);
        out
    }

    pub fn is_valid(&self) -> bool {
        self.south.is_finite()
            && self.west.is_finite()
            && self.north.is_finite()
            && self.east.is_finite()
            && self.south <= self.north
            && self.west <= self.east
    }

    pub fn extend(&mut self, p: GeoPoint) {
        if !p.lat_deg.is_finite() || !p.lon_deg.is_finite() {
            return;
        }
        self.south = self.south.min(p.lat_deg);
        self.north = self.north.max(p.lat_deg);
        self.west = self.west.min(p.lon_deg);
        self.east = self.east.max(p.lon_deg);
    }

    /// Smallest box covering both inputs. An empty side is ignored.
    pub fn union(&self, other: &Self) -> Self {
        if !other.is_valid() {
            return *self;
        }
        if !self.is_valid() {
            return *other;
        }
        Self {
            south: self.south.min(other.south),
            west: self.west.min(other.west),
            north: self.north.max(other.north),
            east: self.east.max(other.east),
        }
    }

    /// Grows the box on every side by `ratio` of its own height/width.
    pub fn pad(&self, ratio: f64) -> Self {
        if !self.is_valid() {
            return *self;
        }
        let dy = (self.north - self.south).abs() * ratio;
        let dx = (self.east - self.west).abs() * ratio;
        Self {
            south: self.south - dy,
            west: self.west - dx,
            north: self.north + dy,
            east: self.east + dx,
        }
    }

    pub fn south_west(&self) -> GeoPoint {
        GeoPoint::new(self.south, self.west)
    }

    pub fn north_east(&self) -> GeoPoint {
        GeoPoint::new(self.north, self.east)
    }

}

#[cfg(test)]
mod tests {
    use super::{GeoBounds, GeoPoint};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_is_invalid_and_union_identity() {
        let empty = GeoBounds::empty();
        assert!(!empty.is_valid());

        let b = GeoBounds::from_corners(GeoPoint::new(41.0, 12.0), GeoPoint::new(42.0, 13.0));
        assert_eq!(empty.union(&b), b);
        assert_eq!(b.union(&empty), b);
    }

    #[test]
    fn union_covers_both() {
        let a = GeoBounds::from_corners(GeoPoint::new(41.0, 12.0), GeoPoint::new(41.5, 12.5));
        let b = GeoBounds::from_corners(GeoPoint::new(41.2, 12.8), GeoPoint::new(42.0, 13.0));
        let u = a.union(&b);
        assert_eq!(u.south_west(), GeoPoint::new(41.0, 12.0));
        assert_eq!(u.north_east(), GeoPoint::new(42.0, 13.0));
    }

    #[test]
    fn pad_grows_by_fraction_of_extent() {
        let b = GeoBounds::from_corners(GeoPoint::new(41.0, 12.0), GeoPoint::new(42.0, 13.0));
        let p = b.pad(0.1);
        assert!(close(p.south, 40.9));
        assert!(close(p.north, 42.1));
        assert!(close(p.west, 11.9));
        assert!(close(p.east, 13.1));
    }

    #[test]
    fn single_point_is_valid_but_degenerate() {
        let mut b = GeoBounds::empty();
        b.extend(GeoPoint::new(41.9, 12.5));
        assert!(b.is_valid());
        assert_eq!(b.south_west(), b.north_east());
        assert_eq!(b.pad(0.1), b);
    }

    #[test]
    fn non_finite_points_are_ignored() {
        let mut b = GeoBounds::empty();
        b.extend(GeoPoint::new(f64::NAN, 12.0));
        assert!(!b.is_valid());
    }
}
