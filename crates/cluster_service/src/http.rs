use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use geocluster::{BoundingBox, Catalog, ClusterResponse, Coordinates, GeoPoint};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::params::{self, QueryParams};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LocationView {
    id: String,
    display_name: Option<String>,
    coordinates: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
}

impl From<GeoPoint> for LocationView {
    fn from(point: GeoPoint) -> Self {
        Self {
            id: point.id,
            display_name: point.label,
            coordinates: point.coordinates,
            state: point.attributes.region,
        }
    }
}

#[derive(Debug, Serialize)]
struct LocationList {
    locations: Vec<LocationView>,
    count: usize,
}

#[derive(Debug, Serialize)]
struct VideoLocation {
    coordinates: Coordinates,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoView {
    id: String,
    title: Option<String>,
    amendments: Vec<String>,
    participants: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    locations: Vec<VideoLocation>,
}

impl From<GeoPoint> for VideoView {
    fn from(point: GeoPoint) -> Self {
        Self {
            id: point.id,
            title: point.label,
            amendments: point.attributes.amendments.into_iter().collect(),
            participants: point.attributes.participants.into_iter().collect(),
            state: point.attributes.region,
            locations: vec![VideoLocation {
                coordinates: point.coordinates,
            }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    page: u32,
    size: u32,
    total_elements: usize,
}

#[derive(Debug, Serialize)]
struct SearchResults {
    results: Vec<VideoView>,
    pagination: Pagination,
}

/// Public API routes nested under `api_prefix`, plus the health probe at the root.
///
/// None of these routes require authentication.
pub fn router(state: AppState, api_prefix: &str) -> Router {
    let api = Router::new()
        .route("/locations", get(list_locations))
        .route("/locations/cluster", get(location_clusters))
        .route("/locations/:id", get(get_location))
        .route("/search", get(search_videos))
        .route("/search/cluster", get(search_clusters));

    let prefix = format!("/{}", api_prefix.trim_matches('/'));
    let app = if prefix == "/" {
        api
    } else {
        Router::new().nest(&prefix, api)
    };

    app.route("/actuator/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}

async fn location_clusters(
    State(state): State<AppState>,
    Query(query): Query<QueryParams>,
) -> Result<Json<ClusterResponse>, ApiError> {
    let result = run_cluster(&state, "locations_cluster", state.locations.as_ref(), &query);
    finish(&state, "locations_cluster", result)
}

async fn search_clusters(
    State(state): State<AppState>,
    Query(query): Query<QueryParams>,
) -> Result<Json<ClusterResponse>, ApiError> {
    let result = run_cluster(&state, "search_cluster", state.videos.as_ref(), &query);
    finish(&state, "search_cluster", result)
}

async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<QueryParams>,
) -> Result<Json<LocationList>, ApiError> {
    let result = locations_in_bbox(&state, &query);
    finish(&state, "locations_list", result)
}

fn locations_in_bbox(state: &AppState, query: &QueryParams) -> Result<Json<LocationList>, ApiError> {
    let bbox = params::required_bbox(query)?;
    let filter = params::attribute_filter(query);
    let locations: Vec<LocationView> = state
        .locations
        .query(&bbox, &filter)?
        .into_iter()
        .map(LocationView::from)
        .collect();
    Ok(Json(LocationList {
        count: locations.len(),
        locations,
    }))
}

async fn search_videos(
    State(state): State<AppState>,
    Query(query): Query<QueryParams>,
) -> Result<Json<SearchResults>, ApiError> {
    let result = matching_videos(&state, &query);
    finish(&state, "search", result)
}

/// Approved videos matching the optional bbox, tag filters and title query,
/// ordered by id and cut to the requested page.
fn matching_videos(state: &AppState, query: &QueryParams) -> Result<Json<SearchResults>, ApiError> {
    let bbox = params::optional_bbox(query)?.unwrap_or(BoundingBox::WORLD);
    let filter = params::attribute_filter(query);
    let window = params::page(query)?;
    let text = params::text_query(query);

    let mut hits: Vec<GeoPoint> = state
        .videos
        .query(&bbox, &filter)?
        .into_iter()
        .filter(|p| bbox.contains(&p.coordinates) && filter.matches(&p.attributes))
        .filter(|p| match (&text, &p.label) {
            (None, _) => true,
            (Some(q), Some(title)) => title.to_lowercase().contains(q.as_str()),
            (Some(_), None) => false,
        })
        .collect();
    hits.sort_by(|a, b| a.id.cmp(&b.id));
    hits.dedup_by(|a, b| a.id == b.id);

    let total_elements = hits.len();
    let results = hits
        .into_iter()
        .skip(window.offset())
        .take(window.size as usize)
        .map(VideoView::from)
        .collect();

    Ok(Json(SearchResults {
        results,
        pagination: Pagination {
            page: window.page,
            size: window.size,
            total_elements,
        },
    }))
}

async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LocationView>, ApiError> {
    let result = match state.locations.get(&id) {
        Ok(Some(point)) => Ok(Json(LocationView::from(point))),
        Ok(None) => Err(ApiError::not_found("location", &id)),
        Err(e) => Err(e.into()),
    };
    finish(&state, "locations_get", result)
}

fn run_cluster(
    state: &AppState,
    endpoint: &'static str,
    catalog: &dyn Catalog,
    query: &QueryParams,
) -> Result<Json<ClusterResponse>, ApiError> {
    let request = params::cluster_request(query)?;
    let timer = state
        .metrics
        .cluster_duration_seconds
        .with_label_values(&[endpoint])
        .start_timer();
    let response = match geocluster::cluster(catalog, &request) {
        Ok(response) => {
            timer.observe_duration();
            response
        }
        Err(e) => {
            timer.stop_and_discard();
            return Err(e.into());
        }
    };

    state
        .metrics
        .clustered_points_total
        .with_label_values(&[endpoint])
        .inc_by(response.total_locations as u64);
    tracing::debug!(
        endpoint,
        zoom = response.zoom,
        total_locations = response.total_locations,
        clusters = response.clusters.len(),
        "Served clusters"
    );
    Ok(Json(response))
}

/// Records the outcome of a request in the metrics.
fn finish<T>(state: &AppState, endpoint: &'static str, result: Result<T, ApiError>) -> Result<T, ApiError> {
    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            if e.code == "VALIDATION_ERROR" {
                state.metrics.validation_errors_total.inc();
                tracing::debug!(endpoint, details = ?e.details, "Rejected request parameters");
            }
            e.status
        }
    };
    state.metrics.observe_request(endpoint, status);
    result
}
