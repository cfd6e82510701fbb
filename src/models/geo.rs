//! Geographic types for the near-me channel (WGS84 coordinates).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, String> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err("invalid latitude: must be between -90 and 90".to_string());
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err("invalid longitude: must be between -180 and 180".to_string());
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// A client-supplied map rectangle.
///
/// The two corners are not interchangeable: `location_from` carries the upper
/// longitude bound and the lower latitude bound, `location_to` the mirror.
/// Clients are expected to send `location_from.longitude >=
/// location_to.longitude` and `location_to.latitude >= location_from.latitude`;
/// a rectangle that violates this matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub location_from: GeoPoint,
    pub location_to: GeoPoint,
}

impl Region {
    /// Inclusive lower longitude bound.
    pub fn longitude_min(&self) -> f64 {
        self.location_to.longitude
    }

    /// Inclusive upper longitude bound.
    pub fn longitude_max(&self) -> f64 {
        self.location_from.longitude
    }

    /// Inclusive lower latitude bound.
    pub fn latitude_min(&self) -> f64 {
        self.location_from.latitude
    }

    /// Inclusive upper latitude bound.
    pub fn latitude_max(&self) -> f64 {
        self.location_to.latitude
    }

    /// Whether a point falls inside this rectangle, bounds inclusive.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        longitude >= self.longitude_min()
            && longitude <= self.longitude_max()
            && latitude >= self.latitude_min()
            && latitude <= self.latitude_max()
    }
}

/// An inclusive range of Unix timestamps (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: i64,
    pub to: i64,
}

impl TimeWindow {
    /// Both ends of the window as instants, or `None` when a timestamp is
    /// outside the representable range.
    pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let from = DateTime::<Utc>::from_timestamp(self.from, 0)?;
        let to = DateTime::<Utc>::from_timestamp(self.to, 0)?;
        Some((from, to))
    }
}

/// A connection's currently active viewport: the last region and time window
/// it asked to watch. One per connection, replaced wholesale on every
/// "fetch near me" request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Subscription {
    pub region: Region,
    pub time: TimeWindow,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn region(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Region {
        Region {
            location_from: GeoPoint {
                latitude: lat_min,
                longitude: lon_max,
            },
            location_to: GeoPoint {
                latitude: lat_max,
                longitude: lon_min,
            },
        }
    }

    #[test]
    fn contains_is_inclusive_at_all_four_bounds() {
        let r = region(0.0, 20.0, 10.0, 20.0);

        assert!(r.contains(0.0, 15.0));
        assert!(r.contains(20.0, 15.0));
        assert!(r.contains(5.0, 10.0));
        assert!(r.contains(5.0, 20.0));
        assert!(r.contains(0.0, 10.0));
        assert!(r.contains(20.0, 20.0));
    }

    #[test]
    fn contains_rejects_points_outside() {
        let r = region(0.0, 20.0, 10.0, 20.0);

        assert!(!r.contains(5.0, 25.0));
        assert!(!r.contains(5.0, 9.999));
        assert!(!r.contains(-0.001, 15.0));
        assert!(!r.contains(20.001, 15.0));
    }

    #[test]
    fn inverted_rectangle_matches_nothing() {
        // Corners swapped relative to the expected convention.
        let r = Region {
            location_from: GeoPoint {
                latitude: 20.0,
                longitude: 10.0,
            },
            location_to: GeoPoint {
                latitude: 0.0,
                longitude: 20.0,
            },
        };

        assert!(!r.contains(10.0, 15.0));
    }

    #[test]
    fn contains_matches_direct_arithmetic_for_random_inputs() {
        let mut rng = StdRng::seed_from_u64(0x6e65_6172_6d65);

        for _ in 0..2000 {
            let lat_a: f64 = rng.gen_range(-90.0..=90.0);
            let lat_b: f64 = rng.gen_range(-90.0..=90.0);
            let lon_a: f64 = rng.gen_range(-180.0..=180.0);
            let lon_b: f64 = rng.gen_range(-180.0..=180.0);

            let r = region(
                lat_a.min(lat_b),
                lat_a.max(lat_b),
                lon_a.min(lon_b),
                lon_a.max(lon_b),
            );

            let lat: f64 = rng.gen_range(-90.0..=90.0);
            let lon: f64 = rng.gen_range(-180.0..=180.0);

            let expected = lon >= r.location_to.longitude
                && lon <= r.location_from.longitude
                && lat >= r.location_from.latitude
                && lat <= r.location_to.latitude;

            assert_eq!(r.contains(lat, lon), expected);
        }
    }

    #[test]
    fn time_window_bounds_reject_out_of_range_timestamps() {
        assert!(TimeWindow { from: 1000, to: 2000 }.bounds().is_some());
        assert!(TimeWindow {
            from: i64::MIN,
            to: 2000
        }
        .bounds()
        .is_none());
    }
}
