use std::collections::HashMap;

use rstar::{RTree, RTreeObject, AABB};

use crate::error::CatalogError;
use crate::filter::AttributeFilter;
use crate::geo::BoundingBox;
use crate::point::GeoPoint;

/// Read path into a store of geolocated items.
///
/// Implementations must be safe to query concurrently. The engine never
/// retries a failed query.
pub trait Catalog: Send + Sync {
    /// Points inside `bbox` (edges inclusive) whose attributes satisfy `filter`.
    fn query(&self, bbox: &BoundingBox, filter: &AttributeFilter) -> Result<Vec<GeoPoint>, CatalogError>;

    fn get(&self, id: &str) -> Result<Option<GeoPoint>, CatalogError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone)]
struct PointBox {
    idx: u32,
    env: AABB<[f64; 2]>,
}

impl RTreeObject for PointBox {
    type Envelope = AABB<[f64; 2]>;

    #[inline]
    fn envelope(&self) -> Self::Envelope {
        self.env
    }
}

/// Immutable catalog held in memory and indexed by an R-tree.
pub struct InMemoryCatalog {
    points: Vec<GeoPoint>,
    by_id: HashMap<String, u32>,
    tree: RTree<PointBox>,
}

impl InMemoryCatalog {
    /// Rejects duplicate ids and coordinates outside the WGS-84 range.
    pub fn new(points: Vec<GeoPoint>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(points.len());
        let mut boxes = Vec::with_capacity(points.len());

        for (idx, point) in points.iter().enumerate() {
            if !point.coordinates.is_valid() {
                return Err(CatalogError::InvalidCoordinates {
                    id: point.id.clone(),
                    latitude: point.coordinates.latitude,
                    longitude: point.coordinates.longitude,
                });
            }
            let idx = u32::try_from(idx)
                .map_err(|_| CatalogError::Unavailable("catalog exceeds u32::MAX points".into()))?;
            if by_id.insert(point.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateId(point.id.clone()));
            }
            boxes.push(PointBox {
                idx,
                env: AABB::from_point(point.coordinates.xy()),
            });
        }

        Ok(Self {
            points,
            by_id,
            tree: RTree::bulk_load(boxes),
        })
    }

    pub fn empty() -> Self {
        Self {
            points: Vec::new(),
            by_id: HashMap::new(),
            tree: RTree::new(),
        }
    }
}

impl Catalog for InMemoryCatalog {
    fn query(&self, bbox: &BoundingBox, filter: &AttributeFilter) -> Result<Vec<GeoPoint>, CatalogError> {
        let mut hits: Vec<GeoPoint> = self
            .tree
            .locate_in_envelope(&bbox.envelope())
            .map(|b| &self.points[b.idx as usize])
            .filter(|p| filter.matches(&p.attributes))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(hits)
    }

    fn get(&self, id: &str) -> Result<Option<GeoPoint>, CatalogError> {
        Ok(self.by_id.get(id).map(|&idx| self.points[idx as usize].clone()))
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}
