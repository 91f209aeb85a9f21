//! Geographic coordinates with range validation.

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing [`Coordinates`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CoordinatesError {
    /// Latitude outside the -90..=90 range.
    #[error("latitude {0} is out of range (-90..=90)")]
    LatitudeOutOfRange(f64),
    /// Longitude outside the -180..=180 range.
    #[error("longitude {0} is out of range (-180..=180)")]
    LongitudeOutOfRange(f64),
}

/// A validated latitude/longitude pair (WGS 84 degrees).
///
/// Construction goes through [`Coordinates::new`], so a value of this type
/// is always inside the valid geographic range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    lat: f64,
    lng: f64,
}

impl Coordinates {
    /// Create coordinates, validating both components.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatesError` if latitude is outside -90..=90 or
    /// longitude is outside -180..=180. NaN fails both comparisons and is
    /// rejected as well.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinatesError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinatesError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinatesError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.lng
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_values_inside_range() {
        assert!(Coordinates::new(0.0, 0.0).is_ok());
        assert!(Coordinates::new(-90.0, 180.0).is_ok());
        assert!(Coordinates::new(90.0, -180.0).is_ok());
        assert!(Coordinates::new(-31.2503, -61.4867).is_ok());
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        assert_eq!(
            Coordinates::new(90.1, 0.0),
            Err(CoordinatesError::LatitudeOutOfRange(90.1))
        );
        assert_eq!(
            Coordinates::new(-91.0, 0.0),
            Err(CoordinatesError::LatitudeOutOfRange(-91.0))
        );
    }

    #[test]
    fn rejects_out_of_range_longitude() {
        assert_eq!(
            Coordinates::new(0.0, 180.5),
            Err(CoordinatesError::LongitudeOutOfRange(180.5))
        );
        assert_eq!(
            Coordinates::new(0.0, -200.0),
            Err(CoordinatesError::LongitudeOutOfRange(-200.0))
        );
    }

    #[test]
    fn rejects_nan() {
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(Coordinates::new(0.0, f64::NAN).is_err());
    }
}
