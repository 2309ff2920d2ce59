//! What the map renderer is asked to draw.

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Title of the marker placed at the user's position.
pub const USER_MARKER_TITLE: &str = "You are here";

/// Degrees of latitude/longitude spanned by the default region.
pub const DEFAULT_DELTA: f64 = 0.01;

/// A rectangular window onto the map, centered on a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub center: Coordinate,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Region {
    pub fn new(center: Coordinate, latitude_delta: f64, longitude_delta: f64) -> Self {
        Self {
            center,
            latitude_delta,
            longitude_delta,
        }
    }

    /// Longitude span `[west, east]`, clamped to the valid range.
    pub fn x_bounds(&self) -> [f64; 2] {
        let half = self.longitude_delta / 2.0;
        [
            (self.center.longitude - half).max(-180.0),
            (self.center.longitude + half).min(180.0),
        ]
    }

    /// Latitude span `[south, north]`, clamped to the valid range.
    pub fn y_bounds(&self) -> [f64; 2] {
        let half = self.latitude_delta / 2.0;
        [
            (self.center.latitude - half).max(-90.0),
            (self.center.latitude + half).min(90.0),
        ]
    }

    pub fn contains(&self, c: Coordinate) -> bool {
        let [west, east] = self.x_bounds();
        let [south, north] = self.y_bounds();
        (west..=east).contains(&c.longitude) && (south..=north).contains(&c.latitude)
    }
}

/// A labeled point on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub coordinate: Coordinate,
    pub title: String,
}

/// A complete render request: region plus markers.
///
/// Only ever built from a known coordinate, so a map view always has a center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    pub region: Region,
    pub markers: Vec<Marker>,
    pub shows_user_location: bool,
}

impl MapView {
    /// A view centered on the user with a single "You are here" marker.
    pub fn user_location(
        coordinate: Coordinate,
        latitude_delta: f64,
        longitude_delta: f64,
    ) -> Self {
        Self {
            region: Region::new(coordinate, latitude_delta, longitude_delta),
            markers: vec![Marker {
                coordinate,
                title: USER_MARKER_TITLE.to_string(),
            }],
            shows_user_location: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_location_view_is_centered_with_one_marker() {
        let c = Coordinate::new(37.0, -122.0).unwrap();
        let view = MapView::user_location(c, DEFAULT_DELTA, DEFAULT_DELTA);

        assert_eq!(view.region.center, c);
        assert_eq!(view.markers.len(), 1);
        assert_eq!(view.markers[0].title, "You are here");
        assert_eq!(view.markers[0].coordinate, c);
        assert!(view.region.contains(c));
    }

    #[test]
    fn bounds_are_clamped_at_the_poles() {
        let c = Coordinate::new(89.999, 179.999).unwrap();
        let region = Region::new(c, 0.01, 0.01);
        assert!((region.y_bounds()[1] - 90.0).abs() < f64::EPSILON);
        assert!((region.x_bounds()[1] - 180.0).abs() < f64::EPSILON);
    }
}
