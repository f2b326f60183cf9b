//! Shared gateway state

use crate::session_routes::SessionStore;
use dataset_fetch::{DatasetClient, Source};
use geo_resolver::GeoResolver;
use geojson::FeatureCollection;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Region geometry loaded once at startup
#[derive(Debug)]
pub enum GeometryStore {
    Ready {
        source: String,
        collection: Arc<FeatureCollection>,
    },
    /// Map payloads are served without geometry
    Unavailable { source: String, reason: String },
}

impl GeometryStore {
    pub async fn load(client: &DatasetClient, source: &Source) -> Self {
        match client.load_geometry(source).await {
            Ok(collection) => {
                info!("   Geometry: {} regions from {}", collection.features.len(), source);
                GeometryStore::Ready {
                    source: source.to_string(),
                    collection: Arc::new(collection),
                }
            }
            Err(e) => {
                warn!("   Geometry unavailable from {}: {}", source, e);
                GeometryStore::Unavailable {
                    source: source.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn collection(&self) -> Result<&Arc<FeatureCollection>, &str> {
        match self {
            GeometryStore::Ready { collection, .. } => Ok(collection),
            GeometryStore::Unavailable { reason, .. } => Err(reason.as_str()),
        }
    }

    pub fn source(&self) -> &str {
        match self {
            GeometryStore::Ready { source, .. } | GeometryStore::Unavailable { source, .. } => source.as_str(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<DatasetClient>,
    pub geometry: Arc<GeometryStore>,
    pub resolver: Arc<GeoResolver>,
    pub sessions: Arc<SessionStore>,
    pub sequence_base_url: Arc<str>,
}

impl AppState {
    pub fn new(
        client: DatasetClient,
        geometry: GeometryStore,
        sequence_base_url: &str,
        session_idle_sec: u64,
    ) -> Self {
        Self {
            client: Arc::new(client),
            geometry: Arc::new(geometry),
            resolver: Arc::new(GeoResolver::default()),
            sessions: Arc::new(SessionStore::new(Duration::from_secs(session_idle_sec))),
            sequence_base_url: Arc::from(sequence_base_url),
        }
    }
}
