use std::str::FromStr;

use rstar::AABB;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

/// A WGS-84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[inline]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (MIN_LATITUDE..=MAX_LATITUDE).contains(&self.latitude)
            && (MIN_LONGITUDE..=MAX_LONGITUDE).contains(&self.longitude)
    }

    /// `[lng, lat]`, the axis order used by the spatial indexes.
    #[inline]
    pub(crate) fn xy(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// A query viewport, `minLng,minLat,maxLng,maxLat`.
///
/// Only constructible through [`BoundingBox::new`] or [`str::parse`], both of
/// which reject non-finite values, out-of-range degrees and inverted edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    min_lng: f64,
    min_lat: f64,
    max_lng: f64,
    max_lat: f64,
}

impl BoundingBox {
    pub const FIELD: &'static str = "bbox";

    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Result<Self, ValidationError> {
        let invalid = |message: String| ValidationError::new(Self::FIELD, message);

        if ![min_lng, min_lat, max_lng, max_lat].iter().all(|v| v.is_finite()) {
            return Err(invalid("bbox values must be finite numbers".into()));
        }
        for lng in [min_lng, max_lng] {
            if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&lng) {
                return Err(invalid(format!("longitude {lng} is outside [-180, 180]")));
            }
        }
        for lat in [min_lat, max_lat] {
            if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&lat) {
                return Err(invalid(format!("latitude {lat} is outside [-90, 90]")));
            }
        }
        if min_lng > max_lng {
            return Err(invalid(format!("minLng {min_lng} is greater than maxLng {max_lng}")));
        }
        if min_lat > max_lat {
            return Err(invalid(format!("minLat {min_lat} is greater than maxLat {max_lat}")));
        }

        Ok(Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        })
    }

    /// The whole coordinate range.
    pub const WORLD: BoundingBox = BoundingBox {
        min_lng: MIN_LONGITUDE,
        min_lat: MIN_LATITUDE,
        max_lng: MAX_LONGITUDE,
        max_lat: MAX_LATITUDE,
    };

    pub fn min_lng(&self) -> f64 {
        self.min_lng
    }

    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    pub fn max_lng(&self) -> f64 {
        self.max_lng
    }

    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    /// Inclusive on every edge.
    pub fn contains(&self, c: &Coordinates) -> bool {
        (self.min_lat..=self.max_lat).contains(&c.latitude)
            && (self.min_lng..=self.max_lng).contains(&c.longitude)
    }

    pub(crate) fn envelope(&self) -> AABB<[f64; 2]> {
        AABB::from_corners([self.min_lng, self.min_lat], [self.max_lng, self.max_lat])
    }
}

impl FromStr for BoundingBox {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = raw.split(',').map(str::trim).collect();
        if tokens.len() != 4 {
            return Err(ValidationError::new(
                Self::FIELD,
                format!(
                    "expected 4 comma-separated values minLng,minLat,maxLng,maxLat, got {}",
                    tokens.len()
                ),
            ));
        }

        let mut values = [0.0f64; 4];
        for (slot, token) in values.iter_mut().zip(&tokens) {
            if token.is_empty() {
                return Err(ValidationError::new(Self::FIELD, "bbox contains an empty value"));
            }
            *slot = token.parse().map_err(|_| {
                ValidationError::new(Self::FIELD, format!("'{token}' is not a number"))
            })?;
        }

        let [min_lng, min_lat, max_lng, max_lat] = values;
        Self::new(min_lng, min_lat, max_lng, max_lat)
    }
}

/// Tight axis-aligned bounds over a set of coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Degenerate bounds holding a single position.
    pub fn around(c: Coordinates) -> Self {
        Self {
            min_lat: c.latitude,
            max_lat: c.latitude,
            min_lng: c.longitude,
            max_lng: c.longitude,
        }
    }

    pub fn extend(&mut self, c: Coordinates) {
        self.min_lat = self.min_lat.min(c.latitude);
        self.max_lat = self.max_lat.max(c.latitude);
        self.min_lng = self.min_lng.min(c.longitude);
        self.max_lng = self.max_lng.max(c.longitude);
    }

    pub fn contains(&self, c: &Coordinates) -> bool {
        (self.min_lat..=self.max_lat).contains(&c.latitude)
            && (self.min_lng..=self.max_lng).contains(&c.longitude)
    }

    /// Pulls `c` onto the nearest point inside the bounds.
    pub fn clamp(&self, c: Coordinates) -> Coordinates {
        Coordinates::new(
            c.latitude.clamp(self.min_lat, self.max_lat),
            c.longitude.clamp(self.min_lng, self.max_lng),
        )
    }
}
