//! Geometry capability over `geo`: validation, area, and the touching
//! predicate. Coordinates are planar, in metres of a projected CRS.

use geo::{Area, BoundingRect, Coord, Polygon, Rect, Relate};

use crate::error::{Result, SelectionError};

/// Square metres per square kilometre.
pub const M2_PER_KM2: f64 = 1.0e6;

/// Check that `polygon` is usable for area and adjacency evaluation and
/// return its bounding rectangle.
///
/// Rejects an empty exterior, fewer than three distinct exterior vertices,
/// non-finite coordinates, and zero enclosed area.
pub fn validate(index: usize, polygon: &Polygon<f64>) -> Result<Rect<f64>> {
    let fail = |reason: &str| SelectionError::Geometry {
        index,
        reason: reason.to_string(),
    };

    let all_coords = polygon
        .exterior()
        .coords()
        .chain(polygon.interiors().iter().flat_map(|ring| ring.coords()));
    for c in all_coords {
        if !c.x.is_finite() || !c.y.is_finite() {
            return Err(fail("non-finite coordinate"));
        }
    }

    let mut vertices: Vec<Coord<f64>> = polygon.exterior().coords().copied().collect();
    if vertices.is_empty() {
        return Err(fail("empty exterior ring"));
    }
    vertices.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    vertices.dedup();
    if vertices.len() < 3 {
        return Err(fail("exterior ring has fewer than three distinct vertices"));
    }

    if polygon.unsigned_area() <= 0.0 {
        return Err(fail("polygon encloses zero area"));
    }

    polygon
        .bounding_rect()
        .ok_or_else(|| fail("polygon has no bounding rectangle"))
}

/// Planar area in square kilometres.
#[inline]
pub fn area_km2(polygon: &Polygon<f64>) -> f64 {
    polygon.unsigned_area() / M2_PER_KM2
}

/// True when the polygons share at least one boundary point and their
/// interiors do not intersect (DE-9IM touches).
#[inline]
pub fn touches(a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
    a.relate(b).is_touches()
}

/// Closed bounding-rectangle intersection. Touching polygons always have
/// meeting envelopes, so this is an exact pre-filter for [`touches`].
#[inline]
pub fn envelopes_meet(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x <= b.max().x
        && b.min().x <= a.max().x
        && a.min().y <= b.max().y
        && b.min().y <= a.max().y
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{polygon, LineString};

    fn square(x: f64, y: f64, side: f64) -> Polygon<f64> {
        polygon![
            (x: x, y: y),
            (x: x + side, y: y),
            (x: x + side, y: y + side),
            (x: x, y: y + side),
        ]
    }

    #[test]
    fn shared_edge_touches() {
        assert!(touches(&square(0.0, 0.0, 1.0), &square(1.0, 0.0, 1.0)));
    }

    #[test]
    fn shared_corner_touches() {
        assert!(touches(&square(0.0, 0.0, 1.0), &square(1.0, 1.0, 1.0)));
    }

    #[test]
    fn overlap_and_gap_do_not_touch() {
        assert!(!touches(&square(0.0, 0.0, 1.0), &square(0.5, 0.5, 1.0)));
        assert!(!touches(&square(0.0, 0.0, 1.0), &square(2.0, 0.0, 1.0)));
    }

    #[test]
    fn area_is_reported_in_square_kilometres() {
        assert_relative_eq!(area_km2(&square(0.0, 0.0, 1000.0)), 1.0, epsilon = 1e-12);
        assert_relative_eq!(area_km2(&square(0.0, 0.0, 500.0)), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn validate_returns_bounds() {
        let rect = validate(0, &square(2.0, 3.0, 4.0)).unwrap();
        assert_eq!(rect.min(), Coord { x: 2.0, y: 3.0 });
        assert_eq!(rect.max(), Coord { x: 6.0, y: 7.0 });
    }

    #[test]
    fn validate_rejects_degenerate_rings() {
        let empty = Polygon::new(LineString::<f64>::new(vec![]), vec![]);
        assert!(matches!(validate(4, &empty), Err(SelectionError::Geometry { index: 4, .. })));

        let collinear = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0)];
        assert!(matches!(validate(1, &collinear), Err(SelectionError::Geometry { index: 1, .. })));

        let nan = polygon![(x: 0.0, y: 0.0), (x: f64::NAN, y: 0.0), (x: 1.0, y: 1.0)];
        assert!(matches!(validate(2, &nan), Err(SelectionError::Geometry { index: 2, .. })));
    }

    #[test]
    fn envelopes_meet_on_shared_boundary() {
        let a = square(0.0, 0.0, 1.0).bounding_rect().unwrap();
        let b = square(1.0, 0.0, 1.0).bounding_rect().unwrap();
        let c = square(1.5, 0.0, 1.0).bounding_rect().unwrap();
        assert!(envelopes_meet(&a, &b));
        assert!(!envelopes_meet(&a, &c));
    }
}
