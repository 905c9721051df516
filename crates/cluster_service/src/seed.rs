use anyhow::Context;
use geocluster::{Attributes, Coordinates, GeoPoint, InMemoryCatalog};
use serde::Deserialize;
use std::path::Path;

const DEV_SEED: &str = include_str!("../seed/dev_seed.json");

/// Catalog contents loaded at startup.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedFile {
    #[serde(default)]
    pub locations: Vec<SeedLocation>,
    #[serde(default)]
    pub videos: Vec<SeedVideo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedLocation {
    pub id: String,
    pub display_name: String,
    pub coordinates: Coordinates,
    pub state: Option<String>,
    #[serde(default)]
    pub amendments: Vec<String>,
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedVideo {
    pub id: String,
    pub title: String,
    pub status: ModerationStatus,
    #[serde(default)]
    pub amendments: Vec<String>,
    #[serde(default)]
    pub participants: Vec<String>,
    pub state: Option<String>,
    pub coordinates: Option<Coordinates>,
}

pub struct Catalogs {
    pub locations: InMemoryCatalog,
    pub videos: InMemoryCatalog,
}

impl SeedFile {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).context("Failed to parse catalog seed JSON")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog seed {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid catalog seed {}", path.display()))
    }

    /// The development seed compiled into the binary.
    pub fn dev() -> anyhow::Result<Self> {
        Self::parse(DEV_SEED)
    }

    /// Builds the location and video catalogs. Only approved videos with
    /// coordinates are clusterable.
    pub fn into_catalogs(self) -> anyhow::Result<Catalogs> {
        let locations: Vec<GeoPoint> = self
            .locations
            .into_iter()
            .map(|loc| GeoPoint {
                id: loc.id,
                label: Some(loc.display_name),
                coordinates: loc.coordinates,
                attributes: Attributes::default()
                    .with_amendments(&loc.amendments)
                    .with_participants(&loc.participants)
                    .with_region(loc.state.as_deref()),
            })
            .collect();

        let total_videos = self.videos.len();
        let videos: Vec<GeoPoint> = self
            .videos
            .into_iter()
            .filter(|v| v.status == ModerationStatus::Approved)
            .filter_map(|v| {
                let coordinates = v.coordinates?;
                Some(GeoPoint {
                    id: v.id,
                    label: Some(v.title),
                    coordinates,
                    attributes: Attributes::default()
                        .with_amendments(&v.amendments)
                        .with_participants(&v.participants)
                        .with_region(v.state.as_deref()),
                })
            })
            .collect();

        tracing::info!(
            locations = locations.len(),
            videos_total = total_videos,
            videos_clusterable = videos.len(),
            "Loaded catalog seed"
        );

        Ok(Catalogs {
            locations: InMemoryCatalog::new(locations).context("Invalid location catalog")?,
            videos: InMemoryCatalog::new(videos).context("Invalid video catalog")?,
        })
    }
}
