//! geocluster: zoom-dependent clustering of geolocated map markers.
//!
//! - Points come from a [`Catalog`] (bbox + attribute filter query).
//! - Clustering radius is a pure function of zoom: `45° / 2^zoom`.
//! - Grouping is single-linkage over planar lng/lat degrees (chaining allowed).
//! - Each group reports centroid (mean), member count and tight bounds.
//!
//! Wire shape (camelCase JSON):
//!   { "clusters": [ { "id", "coordinates": {latitude, longitude},
//!                     "count", "bounds": {minLat, maxLat, minLng, maxLng} } ],
//!     "totalLocations", "zoom" }

pub mod catalog;
pub mod cluster;
pub mod engine;
pub mod error;
pub mod filter;
pub mod geo;
pub mod point;

pub use catalog::{Catalog, InMemoryCatalog};
pub use cluster::{cluster_points, epsilon_for_zoom, Cluster, MAX_ZOOM};
pub use engine::{cluster, ClusterRequest, ClusterResponse};
pub use error::{CatalogError, ClusterError, ValidationError};
pub use filter::AttributeFilter;
pub use geo::{BoundingBox, Bounds, Coordinates};
pub use point::{Attributes, GeoPoint};
