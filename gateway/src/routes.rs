//! Dataset and map API routes

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use choropleth::{ColorScale, Legend};
use geojson::FeatureCollection;
use map_session::Overview;
use sample_records::{CountryBucket, CountryTally, ParseWarning, SampleRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GatewayError;
use crate::session_routes;
use crate::state::{AppState, GeometryStore};

/// `?url=` query shared by the dataset endpoints
#[derive(Debug, Deserialize)]
pub struct DatasetQuery {
    pub url: Option<String>,
}

impl DatasetQuery {
    pub fn url(&self) -> Result<&str, GatewayError> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or(GatewayError::MissingUrl)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchDataResponse {
    pub success: bool,
    pub data: Vec<SampleRecord>,
    pub country_summary: Vec<CountryBucket>,
    pub total_count: usize,
    pub parse_warnings: Vec<ParseWarning>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapPayload {
    pub source: String,
    pub overview: Overview,
    pub countries: Vec<CountryTally>,
    /// Regions with `displayName`, `matchedCount`, `hasData` and `fillColor`
    pub geometry: Option<FeatureCollection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry_error: Option<String>,
    pub unmatched: Vec<String>,
    pub warning: Option<String>,
    pub legend: Legend,
    pub parse_warnings: Vec<ParseWarning>,
    pub generated_at: DateTime<Utc>,
}

/// Rows plus per-country buckets for a remote dataset
pub async fn fetch_data(
    State(state): State<AppState>,
    Query(query): Query<DatasetQuery>,
) -> Result<Json<FetchDataResponse>, GatewayError> {
    let url = query.url()?;
    let dataset = state.client.fetch(url).await?;
    let summary = dataset.summarize();

    Ok(Json(FetchDataResponse {
        success: true,
        data: dataset.records.clone(),
        total_count: summary.total_count(),
        country_summary: summary.into_buckets(),
        parse_warnings: dataset.warnings.clone(),
    }))
}

/// Everything a map view needs for one dataset
pub async fn map_payload(
    State(state): State<AppState>,
    Query(query): Query<DatasetQuery>,
) -> Result<Json<MapPayload>, GatewayError> {
    let url = query.url()?;
    let dataset = state.client.fetch(url).await?;
    let summary = dataset.summarize();
    let scale = ColorScale::from_summary(&summary);

    let (geometry, geometry_error, unmatched, warning) = match state.geometry.collection() {
        Ok(collection) => {
            let mut resolution = state.resolver.resolve(&summary, collection);
            scale.paint(&mut resolution.features, &resolution.regions);
            let warning = resolution.warning_message();
            (Some(resolution.features), None, resolution.unmatched, warning)
        }
        Err(reason) => {
            debug!("Serving map for {} without geometry", url);
            (None, Some(reason.to_string()), Vec::new(), None)
        }
    };

    Ok(Json(MapPayload {
        source: url.to_string(),
        overview: Overview::of(&summary),
        countries: summary.tallies(),
        geometry,
        geometry_error,
        unmatched,
        warning,
        legend: scale.legend(),
        parse_warnings: dataset.warnings.clone(),
        generated_at: Utc::now(),
    }))
}

/// Raw region geometry as loaded at startup
pub async fn geometry(State(state): State<AppState>) -> Result<Json<FeatureCollection>, GatewayError> {
    match state.geometry.as_ref() {
        GeometryStore::Ready { collection, .. } => Ok(Json(collection.as_ref().clone())),
        GeometryStore::Unavailable { reason, .. } => Err(GatewayError::GeometryUnavailable(reason.clone())),
    }
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let regions = state.geometry.collection().map(|c| c.features.len()).ok();
    let (cached, fresh) = state.client.cache_stats().await;
    let sessions = state.sessions.len().await;

    Json(serde_json::json!({
        "status": "healthy",
        "service": "atlas-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "geometry": {
            "source": state.geometry.source(),
            "loaded": regions.is_some(),
            "regions": regions,
        },
        "sessions": sessions,
        "cache": { "entries": cached, "fresh": fresh },
    }))
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/fetch-data", get(fetch_data))
        .route("/api/map", get(map_payload))
        .route("/api/geometry", get(geometry))
        .nest("/api/sessions", session_routes::session_router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_json, spawn_upstream, test_state, world};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health() {
        let app = app(test_state(Some(world())));
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["geometry"]["regions"], 3);
    }

    #[tokio::test]
    async fn test_fetch_data_requires_url() {
        let (status, body) = get_json(app(test_state(None)), "/api/fetch-data").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "URL parameter is required");

        let (status, _) = get_json(app(test_state(None)), "/api/fetch-data?url=").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_fetch_data_success() {
        let upstream = spawn_upstream().await;
        let uri = format!("/api/fetch-data?url={}/samples.tsv", upstream);
        let (status, body) = get_json(app(test_state(None)), &uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["totalCount"], 18);
        assert_eq!(body["data"].as_array().unwrap().len(), 18);

        let buckets = body["countrySummary"].as_array().unwrap();
        assert_eq!(buckets[0]["country"], "Peru");
        assert_eq!(buckets[0]["count"], 12);
        assert_eq!(buckets[0]["data"].as_array().unwrap().len(), 12);
        assert_eq!(buckets[0]["data"][0]["accessionVersion"], "PERU_1.1");
        assert!(buckets.iter().any(|b| b["country"] == "Unknown"));
    }

    #[tokio::test]
    async fn test_fetch_data_upstream_failure() {
        let upstream = spawn_upstream().await;
        let uri = format!("/api/fetch-data?url={}/missing.tsv", upstream);
        let (status, body) = get_json(app(test_state(None)), &uri).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch or parse data");
        assert!(body["details"].as_str().unwrap().contains("404"));
    }

    #[tokio::test]
    async fn test_map_payload() {
        let upstream = spawn_upstream().await;
        let uri = format!("/api/map?url={}/samples.tsv", upstream);
        let (status, body) = get_json(app(test_state(Some(world()))), &uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["overview"]["totalSamples"], 18);
        assert_eq!(body["overview"]["countryCount"], 3);
        assert_eq!(body["unmatched"], serde_json::json!(["Czechia"]));
        assert!(body["warning"].as_str().unwrap().ends_with(": Czechia"));
        assert_eq!(body["legend"]["max"], 12);

        let features = body["geometry"]["features"].as_array().unwrap();
        let peru = &features[0]["properties"];
        assert_eq!(peru["displayName"], "Peru");
        assert_eq!(peru["matchedCount"], 12);
        assert_eq!(peru["fillColor"], "#de2d26");
        let germany = &features[2]["properties"];
        assert_eq!(germany["hasData"], false);
        assert_eq!(germany["fillColor"], "#e0e0e0");
        assert!(body.get("geometryError").is_none());
    }

    #[tokio::test]
    async fn test_map_payload_without_geometry() {
        let upstream = spawn_upstream().await;
        let uri = format!("/api/map?url={}/samples.tsv", upstream);
        let (status, body) = get_json(app(test_state(None)), &uri).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["geometry"].is_null());
        assert!(body["geometryError"].is_string());
        assert_eq!(body["countries"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_geometry_route() {
        let (status, body) = get_json(app(test_state(Some(world()))), "/api/geometry").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "FeatureCollection");

        let (status, body) = get_json(app(test_state(None)), "/api/geometry").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Geometry unavailable");
    }
}
