use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};

/// Prometheus collectors for the cluster service.
///
/// Wrapped in an `Arc` and shared by every request handler.
pub struct Metrics {
    pub registry: Registry,
    /// HTTP requests by endpoint and response status.
    pub http_requests_total: IntCounterVec,
    /// Time spent validating, querying and clustering one request.
    pub cluster_duration_seconds: HistogramVec,
    /// Points fed into the clustering pass, by endpoint.
    pub clustered_points_total: IntCounterVec,
    /// Requests rejected with `VALIDATION_ERROR`.
    pub validation_errors_total: IntCounter,
    /// Points loaded into each catalog at startup.
    pub catalog_points: IntGaugeVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("cluster_service".into()), None)
            .expect("Failed to create custom metrics registry");

        macro_rules! reg {
            ($metric:expr) => {{
                let collector = $metric;
                registry
                    .register(Box::new(collector.clone()))
                    .expect("Failed to register metric");
                collector
            }};
        }

        Self {
            http_requests_total: reg!(IntCounterVec::new(
                Opts::new("http_requests_total", "Total HTTP requests handled"),
                &["endpoint", "status"]
            )
            .unwrap()),
            cluster_duration_seconds: reg!(HistogramVec::new(
                HistogramOpts::new(
                    "cluster_duration_seconds",
                    "Latency of cluster requests including the catalog query"
                )
                .buckets(prometheus::exponential_buckets(0.0001, 2.0, 15).unwrap()),
                &["endpoint"]
            )
            .unwrap()),
            clustered_points_total: reg!(IntCounterVec::new(
                Opts::new("clustered_points_total", "Total points grouped into clusters"),
                &["endpoint"]
            )
            .unwrap()),
            validation_errors_total: reg!(IntCounter::new(
                "validation_errors_total",
                "Total requests rejected for invalid parameters"
            )
            .unwrap()),
            catalog_points: reg!(IntGaugeVec::new(
                Opts::new("catalog_points", "Points held by each catalog"),
                &["catalog"]
            )
            .unwrap()),
            registry,
        }
    }

    /// An `axum::Router` serving the registry on `/metrics`.
    pub fn router(&self) -> Router {
        let registry = self.registry.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let registry = registry.clone();
                async move {
                    let mut buffer = Vec::new();
                    match TextEncoder::new().encode(&registry.gather(), &mut buffer) {
                        Ok(()) => String::from_utf8_lossy(&buffer).into_owned().into_response(),
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to encode metrics");
                            StatusCode::INTERNAL_SERVER_ERROR.into_response()
                        }
                    }
                }
            }),
        )
    }

    pub fn observe_request(&self, endpoint: &str, status: StatusCode) {
        self.http_requests_total
            .with_label_values(&[endpoint, status.as_str()])
            .inc();
    }

    pub fn set_catalog_size(&self, catalog: &str, points: usize) {
        self.catalog_points
            .with_label_values(&[catalog])
            .set(i64::try_from(points).unwrap_or(i64::MAX));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gathers_registered_families_with_prefix() {
        let metrics = Metrics::new();
        metrics.observe_request("locations_cluster", StatusCode::OK);
        metrics.observe_request("locations_cluster", StatusCode::BAD_REQUEST);
        metrics.set_catalog_size("locations", 12);

        let names: Vec<String> = metrics
            .registry
            .gather()
            .iter()
            .map(|mf| mf.get_name().to_string())
            .collect();
        assert!(names.contains(&"cluster_service_http_requests_total".to_string()));
        assert!(names.contains(&"cluster_service_catalog_points".to_string()));

        let ok = metrics
            .http_requests_total
            .with_label_values(&["locations_cluster", "200"])
            .get();
        assert_eq!(ok, 1);
        assert_eq!(metrics.catalog_points.with_label_values(&["locations"]).get(), 12);
    }
}
