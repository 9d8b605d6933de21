use geo::LineString;

use super::GeoPoint;

/// A walking path from the user to a facility.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteGeometry {
    points: Vec<GeoPoint>,
}

impl RouteGeometry {
    /// Returns `None` for fewer than two points, which cannot be drawn as a line
    pub fn new(points: Vec<GeoPoint>) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        Some(Self { points })
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn start(&self) -> GeoPoint {
        self.points[0]
    }

    pub fn end(&self) -> GeoPoint {
        self.points[self.points.len() - 1]
    }

    pub fn to_line_string(&self) -> LineString<f64> {
        self.points.iter().map(|p| p.to_coord()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_needs_two_points() {
        let a = GeoPoint::new(10.75, 59.91).unwrap();
        let b = GeoPoint::new(10.76, 59.92).unwrap();

        assert!(RouteGeometry::new(vec![]).is_none());
        assert!(RouteGeometry::new(vec![a]).is_none());

        let route = RouteGeometry::new(vec![a, b]).unwrap();
        assert_eq!(route.start(), a);
        assert_eq!(route.end(), b);
        assert_eq!(route.to_line_string().0.len(), 2);
    }
}
