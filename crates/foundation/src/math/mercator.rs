use super::Vec2;
use crate::bounds::{GeoBounds, GeoPoint};

/// WGS84 semi-major axis (meters).
pub const WGS84_A: f64 = 6_378_137.0;
/// Latitude where the square Web-Mercator world ends.
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.05112878;
/// Edge length of one slippy-map tile at zoom 0.
pub const TILE_SIZE_PX: f64 = 256.0;

fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

pub fn mercator_x_m(lon_deg: f64) -> f64 {
    WGS84_A * lon_deg.to_radians()
}

pub fn mercator_y_m(lat_deg: f64) -> f64 {
    let lat = clamp(lat_deg, -MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG).to_radians();
    WGS84_A * (0.5 * (std::f64::consts::FRAC_PI_2 + lat)).tan().ln()
}

pub fn inverse_mercator_lon_deg(x_m: f64) -> f64 {
    (x_m / WGS84_A).to_degrees()
}

pub fn inverse_mercator_lat_deg(y_m: f64) -> f64 {
    let lat = 2.0 * (y_m / WGS84_A).exp().atan() - std::f64::consts::FRAC_PI_2;
    lat.to_degrees()
}

pub fn project(p: GeoPoint) -> Vec2 {
    Vec2::new(mercator_x_m(p.lon_deg), mercator_y_m(p.lat_deg))
}

/// Screen pixels per projected meter at a slippy-map zoom level.
pub fn scale_px_per_m(zoom: f64) -> f64 {
    let world_width_m = 2.0 * std::f64::consts::PI * WGS84_A;
    TILE_SIZE_PX * zoom.exp2() / world_width_m
}

/// Largest integer zoom at which `bounds` fits inside a viewport of `viewport_px`,
/// clamped to `[min_zoom, max_zoom]`.
///
/// A degenerate (zero-area) box fits at any zoom and yields `max_zoom`.
pub fn bounds_zoom(bounds: &GeoBounds, viewport_px: Vec2, min_zoom: f64, max_zoom: f64) -> f64 {
    if !bounds.is_valid() {
        return min_zoom;
    }
    let size = (project(bounds.north_east()) - project(bounds.south_west())).abs();
    let base = scale_px_per_m(0.0);

    let fit_axis = |extent_m: f64, viewport: f64| -> f64 {
        if extent_m <= f64::EPSILON {
            f64::INFINITY
        } else {
            (viewport / (extent_m * base)).log2()
        }
    };

    let zoom = fit_axis(size.x, viewport_px.x).min(fit_axis(size.y, viewport_px.y));
    if zoom.is_infinite() {
        return max_zoom;
    }
    clamp(zoom.floor(), min_zoom, max_zoom)
}

/// Center of `bounds` in projected space, mapped back to lat/lon.
pub fn projected_center(bounds: &GeoBounds) -> Option<GeoPoint> {
    if !bounds.is_valid() {
        return None;
    }
    let mid = project(bounds.south_west()).midpoint(project(bounds.north_east()));
    Some(GeoPoint::new(
        inverse_mercator_lat_deg(mid.y),
        inverse_mercator_lon_deg(mid.x),
    ))
}

#[cfg(test)]
mod tests {
    use super::{bounds_zoom, inverse_mercator_lat_deg, mercator_y_m, projected_center};
    use crate::bounds::{GeoBounds, GeoPoint};
    use crate::math::Vec2;

    fn sample() -> GeoBounds {
        GeoBounds::from_corners(GeoPoint::new(41.0, 12.0), GeoPoint::new(42.0, 13.0)).pad(0.1)
    }

    #[test]
    fn mercator_y_round_trips() {
        for lat in [-60.0, -10.5, 0.0, 41.9, 80.0] {
            let back = inverse_mercator_lat_deg(mercator_y_m(lat));
            assert!((back - lat).abs() < 1e-9, "{lat} -> {back}");
        }
    }

    #[test]
    fn fits_one_degree_box_in_desktop_viewport() {
        // Height is the limiting axis here: ~1.14px * 2^z <= 768.
        let z = bounds_zoom(&sample(), Vec2::new(1024.0, 768.0), 0.0, 19.0);
        assert_eq!(z, 9.0);
    }

    #[test]
    fn zoom_is_clamped_to_range() {
        assert_eq!(bounds_zoom(&sample(), Vec2::new(1.0, 1.0), 0.0, 19.0), 0.0);
        assert_eq!(bounds_zoom(&sample(), Vec2::new(1024.0, 768.0), 0.0, 5.0), 5.0);
    }

    #[test]
    fn degenerate_box_uses_max_zoom() {
        let mut b = GeoBounds::empty();
        b.extend(GeoPoint::new(41.9, 12.5));
        assert_eq!(bounds_zoom(&b, Vec2::new(800.0, 600.0), 0.0, 19.0), 19.0);
    }

    #[test]
    fn projected_center_is_inside() {
        let b = sample();
        let c = projected_center(&b).expect("valid bounds");
        assert!(c.lat_deg > b.south && c.lat_deg < b.north);
        assert!((c.lon_deg - 12.5).abs() < 1e-9);
    }
}
