//! Fixtures shared by the router tests

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::get,
    Router,
};
use dataset_fetch::{DatasetClient, DatasetClientConfig};
use geojson::FeatureCollection;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::state::{AppState, GeometryStore};

const HEADER: &str = "accessionVersion\tinsdcAccessionFull\tsampleCollectionDate\tgeoLocCountry\tgeoLocAdmin1\thostNameScientific\tauthors";

/// 12 Peru, 3 France, 1 Czechia, 1 without country, 1 "unknown"
pub fn samples_tsv() -> String {
    let mut lines = vec![HEADER.to_string()];
    for i in 1..=12 {
        lines.push(format!("PERU_{i}.1\t\t2024-01-{i:02}\tPeru\tLima\tHomo sapiens\tQuispe, A."));
    }
    for i in 1..=3 {
        lines.push(format!("\tFR{i}\t2023-06-01\tFrance\t\t\t"));
    }
    lines.push("CZ_1.1\t\t\tCzechia\t\t\t".to_string());
    lines.push("NOCOUNTRY_1.1\t\t\t\t\t\t".to_string());
    lines.push("UNK_1.1\t\t\tunknown\t\t\t".to_string());
    lines.join("\n")
}

/// Peru by `name_en`, France by `name`, Germany without data
pub fn world() -> FeatureCollection {
    geo_resolver::parse_geometry(
        r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{"name_en":"Peru","name":"Perú"},"geometry":null},
            {"type":"Feature","properties":{"name":"France"},"geometry":null},
            {"type":"Feature","properties":{"name_en":"Germany"},"geometry":null}
        ]}"#,
    )
    .unwrap()
}

/// Serve the sample TSV on an ephemeral port and return its base URL
pub async fn spawn_upstream() -> String {
    let app = Router::new()
        .route("/samples.tsv", get(|| async { samples_tsv() }))
        .route("/missing.tsv", get(|| async { StatusCode::NOT_FOUND }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn test_state(geometry: Option<FeatureCollection>) -> AppState {
    let client = DatasetClient::new(DatasetClientConfig::default()).unwrap();
    let geometry = match geometry {
        Some(collection) => GeometryStore::Ready {
            source: "fixture".to_string(),
            collection: std::sync::Arc::new(collection),
        },
        None => GeometryStore::Unavailable {
            source: "fixture".to_string(),
            reason: "IO error: No such file or directory".to_string(),
        },
    };
    AppState::new(
        client,
        geometry,
        sample_records::DEFAULT_SEQUENCE_BASE_URL,
        crate::config::DEFAULT_SESSION_IDLE_SEC,
    )
}

pub async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, None).await
}
