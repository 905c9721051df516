use clap::Parser;
use std::{net::SocketAddr, path::PathBuf};

/// `cluster_service` - Map marker clustering for the AccountabilityAtlas catalog.
///
/// Serves `/locations/cluster` and `/search/cluster` over HTTP, backed by an
/// in-memory catalog of locations and approved videos loaded at startup.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Listen address for the public HTTP API.
    #[arg(long, env = "CLUSTER_LISTEN_ADDR", default_value = "0.0.0.0:8083")]
    pub listen_addr: SocketAddr,

    /// Listen address for the Prometheus metrics server.
    #[arg(long, env = "CLUSTER_METRICS_LISTEN_ADDR", default_value = "0.0.0.0:9093")]
    pub metrics_listen_addr: SocketAddr,

    /// Path prefix the API routes are nested under. Use `/` to serve at the root.
    #[arg(long, env = "CLUSTER_API_PREFIX", default_value = "/api/v1")]
    pub api_prefix: String,

    /// JSON seed file for the location and video catalogs.
    ///
    /// When unset, the development seed compiled into the binary is used.
    #[arg(long, env = "CATALOG_SEED_PATH")]
    pub seed_path: Option<PathBuf>,
}
