use std::sync::Arc;

use geocluster::Catalog;

use crate::metrics::Metrics;
use crate::seed::Catalogs;

/// Shared by every handler. Catalogs are immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub locations: Arc<dyn Catalog>,
    pub videos: Arc<dyn Catalog>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(catalogs: Catalogs, metrics: Arc<Metrics>) -> Self {
        metrics.set_catalog_size("locations", catalogs.locations.len());
        metrics.set_catalog_size("videos", catalogs.videos.len());

        Self {
            locations: Arc::new(catalogs.locations),
            videos: Arc::new(catalogs.videos),
            metrics,
        }
    }
}
