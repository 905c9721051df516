use std::collections::VecDeque;

use rstar::{primitives::GeomWithData, RTree};
use serde::Serialize;

use crate::geo::{Bounds, Coordinates};
use crate::point::GeoPoint;

/// Highest zoom accepted by the engine (web map tile convention).
pub const MAX_ZOOM: u8 = 22;

/// Clustering radius at zoom 0, in degrees.
const BASE_EPSILON_DEG: f64 = 45.0;

/// Merge radius in degrees for a zoom level: `45 / 2^zoom`.
///
/// Depends on zoom only, never on the viewport or on point density, so two
/// regions that are far apart stay separate at a fixed zoom however wide the
/// viewport is.
#[inline]
pub fn epsilon_for_zoom(zoom: u8) -> f64 {
    BASE_EPSILON_DEG / 2f64.powi(i32::from(zoom))
}

/// An aggregate over nearby points. Singletons use the same shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: String,
    pub coordinates: Coordinates,
    pub count: usize,
    pub bounds: Bounds,
}

type IndexedXy = GeomWithData<[f64; 2], usize>;

/// Groups `points` by single linkage: two points share a cluster when a chain
/// of hops no longer than [`epsilon_for_zoom`] connects them.
///
/// Points are visited in id order, so the partition, the ids and the output
/// order are identical for the same input set in any order. Output is sorted
/// by descending count, then id.
pub fn cluster_points(points: &[GeoPoint], zoom: u8) -> Vec<Cluster> {
    if points.is_empty() {
        return Vec::new();
    }

    let epsilon = epsilon_for_zoom(zoom);
    let max_squared_radius = epsilon * epsilon;

    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| points[a].id.cmp(&points[b].id));

    let tree: RTree<IndexedXy> = RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .map(|(idx, p)| GeomWithData::new(p.coordinates.xy(), idx))
            .collect(),
    );

    let mut visited = vec![false; points.len()];
    let mut queue = VecDeque::new();
    let mut clusters = Vec::new();

    for &seed in &order {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        queue.push_back(seed);

        let mut members = Vec::new();
        while let Some(current) = queue.pop_front() {
            members.push(current);
            let xy = points[current].coordinates.xy();
            for neighbor in tree.locate_within_distance(xy, max_squared_radius) {
                if !visited[neighbor.data] {
                    visited[neighbor.data] = true;
                    queue.push_back(neighbor.data);
                }
            }
        }

        clusters.push(aggregate(points, seed, &members, zoom));
    }

    clusters.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.id.cmp(&b.id)));

    tracing::debug!(
        zoom,
        epsilon,
        points = points.len(),
        clusters = clusters.len(),
        "Clustered points"
    );
    clusters
}

/// `seed` is the smallest id in `members`.
fn aggregate(points: &[GeoPoint], seed: usize, members: &[usize], zoom: u8) -> Cluster {
    let first = points[seed].coordinates;
    let mut bounds = Bounds::around(first);
    let (mut sum_lat, mut sum_lng) = (0.0, 0.0);

    for &idx in members {
        let c = points[idx].coordinates;
        bounds.extend(c);
        sum_lat += c.latitude;
        sum_lng += c.longitude;
    }

    let n = members.len() as f64;
    // The float mean can land a ulp outside the member extent.
    let centroid = bounds.clamp(Coordinates::new(sum_lat / n, sum_lng / n));

    let id = if members.len() == 1 {
        format!("point:{}", points[seed].id)
    } else {
        format!("cluster:{}:{}", zoom, points[seed].id)
    };

    Cluster {
        id,
        coordinates: centroid,
        count: members.len(),
        bounds,
    }
}
