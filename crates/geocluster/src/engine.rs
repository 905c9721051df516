use serde::Serialize;

use crate::catalog::Catalog;
use crate::cluster::{cluster_points, Cluster, MAX_ZOOM};
use crate::error::{ClusterError, ValidationError};
use crate::filter::AttributeFilter;
use crate::geo::BoundingBox;

/// A validated clustering query.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterRequest {
    bbox: BoundingBox,
    zoom: u8,
    filter: AttributeFilter,
}

impl ClusterRequest {
    pub const ZOOM_FIELD: &'static str = "zoom";

    pub fn new(bbox: BoundingBox, zoom: u8, filter: AttributeFilter) -> Result<Self, ValidationError> {
        if zoom > MAX_ZOOM {
            return Err(zoom_out_of_range());
        }
        Ok(Self { bbox, zoom, filter })
    }

    /// Validates raw `bbox` and `zoom` values, reporting every bad field at once.
    pub fn from_params(
        bbox: Option<&str>,
        zoom: Option<&str>,
        filter: AttributeFilter,
    ) -> Result<Self, ClusterError> {
        let mut errors = Vec::new();

        let bbox = match bbox.map(str::trim) {
            None | Some("") => {
                errors.push(ValidationError::missing(BoundingBox::FIELD));
                None
            }
            Some(raw) => raw.parse::<BoundingBox>().map_err(|e| errors.push(e)).ok(),
        };

        let zoom = match zoom.map(str::trim) {
            None | Some("") => {
                errors.push(ValidationError::missing(Self::ZOOM_FIELD));
                None
            }
            Some(raw) => parse_zoom(raw).map_err(|e| errors.push(e)).ok(),
        };

        match (bbox, zoom) {
            (Some(bbox), Some(zoom)) if errors.is_empty() => Ok(Self { bbox, zoom, filter }),
            _ => Err(ClusterError::Validation(errors)),
        }
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn filter(&self) -> &AttributeFilter {
        &self.filter
    }
}

fn parse_zoom(raw: &str) -> Result<u8, ValidationError> {
    let zoom: i64 = raw.parse().map_err(|_| {
        ValidationError::new(ClusterRequest::ZOOM_FIELD, format!("'{raw}' is not an integer"))
    })?;
    u8::try_from(zoom)
        .ok()
        .filter(|z| *z <= MAX_ZOOM)
        .ok_or_else(zoom_out_of_range)
}

fn zoom_out_of_range() -> ValidationError {
    ValidationError::new(
        ClusterRequest::ZOOM_FIELD,
        format!("zoom must be between 0 and {MAX_ZOOM}"),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResponse {
    pub clusters: Vec<Cluster>,
    pub total_locations: usize,
    pub zoom: u8,
}

/// Fetches the points matching `request` from `catalog` and clusters them.
///
/// Whatever the catalog returns is re-checked against the bbox and filter and
/// de-duplicated by id before grouping.
pub fn cluster(catalog: &dyn Catalog, request: &ClusterRequest) -> Result<ClusterResponse, ClusterError> {
    let fetched = catalog.query(&request.bbox, &request.filter)?;
    let fetched_len = fetched.len();

    let mut points: Vec<_> = fetched
        .into_iter()
        .filter(|p| request.bbox.contains(&p.coordinates) && request.filter.matches(&p.attributes))
        .collect();
    points.sort_by(|a, b| a.id.cmp(&b.id));
    points.dedup_by(|a, b| a.id == b.id);

    if points.len() != fetched_len {
        tracing::warn!(
            fetched = fetched_len,
            kept = points.len(),
            "Catalog returned points outside the query or duplicate ids"
        );
    }

    let clusters = cluster_points(&points, request.zoom);

    Ok(ClusterResponse {
        clusters,
        total_locations: points.len(),
        zoom: request.zoom,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::error::CatalogError;
    use crate::point::GeoPoint;

    fn seed() -> InMemoryCatalog {
        InMemoryCatalog::new(vec![
            GeoPoint::new("sf", 37.7749, -122.4194)
                .with_amendments(["FIRST"])
                .with_participants(["POLICE", "GOVERNMENT"])
                .with_region("CA"),
            GeoPoint::new("oakland", 37.8044, -122.2712)
                .with_amendments(["FIRST", "FOURTH"])
                .with_participants(["POLICE"])
                .with_region("CA"),
            GeoPoint::new("san-jose", 37.3382, -121.8863)
                .with_amendments(["FOURTH"])
                .with_participants(["SECURITY"])
                .with_region("CA"),
            GeoPoint::new("berkeley", 37.8716, -122.2727)
                .with_amendments(["FIRST"])
                .with_participants(["GOVERNMENT"])
                .with_region("CA"),
            GeoPoint::new("fremont", 37.5485, -121.9886)
                .with_amendments(["FIRST", "FIFTH"])
                .with_participants(["POLICE"])
                .with_region("CA"),
            GeoPoint::new("san-antonio", 29.4241, -98.4936)
                .with_amendments(["FIRST"])
                .with_participants(["POLICE", "BUSINESS"])
                .with_region("TX"),
            GeoPoint::new("silverthorne", 39.6255, -106.0694)
                .with_amendments(["FIRST"])
                .with_participants(["GOVERNMENT"])
                .with_region("CO"),
        ])
        .unwrap()
    }

    fn request(bbox: &str, zoom: &str, filter: AttributeFilter) -> ClusterRequest {
        ClusterRequest::from_params(Some(bbox), Some(zoom), filter).unwrap()
    }

    fn total(filter: AttributeFilter) -> usize {
        cluster(&seed(), &request("-125,24,-66,50", "5", filter))
            .unwrap()
            .total_locations
    }

    struct FailingCatalog;

    impl Catalog for FailingCatalog {
        fn query(&self, _: &BoundingBox, _: &AttributeFilter) -> Result<Vec<GeoPoint>, CatalogError> {
            Err(CatalogError::Unavailable("connection refused".into()))
        }

        fn get(&self, _: &str) -> Result<Option<GeoPoint>, CatalogError> {
            Err(CatalogError::Unavailable("connection refused".into()))
        }

        fn len(&self) -> usize {
            0
        }
    }

    /// Ignores the query and returns everything twice.
    struct SloppyCatalog(Vec<GeoPoint>);

    impl Catalog for SloppyCatalog {
        fn query(&self, _: &BoundingBox, _: &AttributeFilter) -> Result<Vec<GeoPoint>, CatalogError> {
            Ok(self.0.iter().chain(&self.0).cloned().collect())
        }

        fn get(&self, _: &str) -> Result<Option<GeoPoint>, CatalogError> {
            Ok(None)
        }

        fn len(&self) -> usize {
            self.0.len()
        }
    }

    #[test]
    fn empty_viewport_is_not_an_error() {
        let resp = cluster(&seed(), &request("170,10,175,15", "5", AttributeFilter::new())).unwrap();
        assert!(resp.clusters.is_empty());
        assert_eq!(resp.total_locations, 0);
        assert_eq!(resp.zoom, 5);
    }

    #[test]
    fn continental_us_at_zoom_four_has_several_clusters() {
        let resp = cluster(&seed(), &request("-125,24,-66,50", "4", AttributeFilter::new())).unwrap();
        assert!(resp.clusters.len() > 1);
        assert_eq!(resp.total_locations, 7);
        assert_eq!(resp.clusters.iter().map(|c| c.count).sum::<usize>(), 7);
        assert_eq!(resp.clusters[0].count, 5);
    }

    #[test]
    fn filters_only_narrow() {
        let all = total(AttributeFilter::new());
        let first = total(AttributeFilter::new().with_amendments(["FIRST"]));
        let government = total(AttributeFilter::new().with_participants(["GOVERNMENT"]));
        let both = total(
            AttributeFilter::new()
                .with_amendments(["FIRST"])
                .with_participants(["GOVERNMENT"]),
        );

        assert_eq!(all, 7);
        assert_eq!(first, 6);
        assert_eq!(government, 3);
        assert_eq!(both, 3);
        assert!(both <= first.min(government));
        assert_eq!(total(AttributeFilter::new().with_participants(["POLICE", "SECURITY"])), 5);
        assert_eq!(total(AttributeFilter::new().with_region("TX")), 1);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let req = request("-125,24,-66,50", "5", AttributeFilter::new().with_amendments(["FIRST"]));
        let catalog = seed();
        assert_eq!(cluster(&catalog, &req).unwrap(), cluster(&catalog, &req).unwrap());
    }

    #[test]
    fn catalog_failure_propagates() {
        let err = cluster(&FailingCatalog, &request("-125,24,-66,50", "5", AttributeFilter::new()))
            .unwrap_err();
        assert!(matches!(err, ClusterError::Catalog(CatalogError::Unavailable(_))));
    }

    #[test]
    fn engine_rechecks_catalog_results() {
        let catalog = SloppyCatalog(vec![
            GeoPoint::new("in", 37.7749, -122.4194).with_amendments(["FIRST"]),
            GeoPoint::new("wrong-tag", 37.8044, -122.2712).with_amendments(["FOURTH"]),
            GeoPoint::new("outside", 29.4241, -98.4936).with_amendments(["FIRST"]),
        ]);
        let req = request("-123,37,-121,38", "5", AttributeFilter::new().with_amendments(["FIRST"]));
        let resp = cluster(&catalog, &req).unwrap();
        assert_eq!(resp.total_locations, 1);
        assert_eq!(resp.clusters.len(), 1);
        assert_eq!(resp.clusters[0].id, "point:in");
    }

    #[test]
    fn missing_zoom_is_a_validation_error() {
        let err = ClusterRequest::from_params(Some("-125,24,-66,50"), None, AttributeFilter::new()).unwrap_err();
        match err {
            ClusterError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::missing("zoom")]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn all_bad_fields_are_reported() {
        let err = ClusterRequest::from_params(Some("invalid-bbox"), Some("abc"), AttributeFilter::new()).unwrap_err();
        let ClusterError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["bbox", "zoom"]);
    }

    #[test]
    fn zoom_must_be_an_integer_in_range() {
        for raw in ["-1", "23", "5.5", "five", "300"] {
            assert!(
                ClusterRequest::from_params(Some("-125,24,-66,50"), Some(raw), AttributeFilter::new()).is_err(),
                "zoom {raw:?}"
            );
        }
        let req = request("-125,24,-66,50", " 22 ", AttributeFilter::new());
        assert_eq!(req.zoom(), MAX_ZOOM);
        assert!(ClusterRequest::new(*req.bbox(), MAX_ZOOM + 1, AttributeFilter::new()).is_err());
    }

    #[test]
    fn blank_bbox_counts_as_missing() {
        let err = ClusterRequest::from_params(Some("  "), Some("5"), AttributeFilter::new()).unwrap_err();
        let ClusterError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors, vec![ValidationError::missing("bbox")]);
    }

    #[test]
    fn response_serializes_in_camel_case() {
        let resp = cluster(&seed(), &request("-123,37,-121,38.5", "5", AttributeFilter::new())).unwrap();
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["totalLocations"], 5);
        assert_eq!(json["zoom"], 5);
        let c = &json["clusters"][0];
        assert_eq!(c["count"], 5);
        assert!(c["coordinates"]["latitude"].is_f64());
        assert!(c["bounds"]["minLat"].is_f64());
        assert!(c["bounds"]["maxLng"].is_f64());
    }
}
