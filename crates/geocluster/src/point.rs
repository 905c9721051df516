use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::filter::{normalize_all, normalize_tag};
use crate::geo::Coordinates;

/// Filterable tags carried by a catalog point, stored normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub amendments: BTreeSet<String>,
    pub participants: BTreeSet<String>,
    pub region: Option<String>,
}

impl Attributes {
    pub fn with_amendments<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.amendments.extend(normalize_all(tags));
        self
    }

    pub fn with_participants<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.participants.extend(normalize_all(tags));
        self
    }

    pub fn with_region(mut self, region: Option<&str>) -> Self {
        self.region = region.map(normalize_tag).filter(|r| !r.is_empty());
        self
    }
}

/// A geolocated catalog item (a location or an approved video).
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub id: String,
    pub label: Option<String>,
    pub coordinates: Coordinates,
    pub attributes: Attributes,
}

impl GeoPoint {
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            label: None,
            coordinates: Coordinates::new(latitude, longitude),
            attributes: Attributes::default(),
        }
    }

    pub fn with_amendments<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.attributes = self.attributes.with_amendments(tags);
        self
    }

    pub fn with_participants<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.attributes = self.attributes.with_participants(tags);
        self
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.attributes = self.attributes.with_region(Some(region));
        self
    }
}
