//! Dataset Fetch
//!
//! Retrieves sample datasets (tab-separated text) and region geometry
//! (GeoJSON) from http(s) URLs or local files.
//!
//! # Usage
//!
//! ```rust,ignore
//! let client = DatasetClient::new(DatasetClientConfig::default())?;
//! let dataset = client.fetch("https://example.org/samples.tsv").await?;
//! let summary = dataset.summarize();
//! ```
//!
//! Parsed datasets are cached per URL for `cache_ttl_sec`.

use geojson::FeatureCollection;
use sample_records::{aggregate, CountrySummary, ParseWarning, RecordError, SampleRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub mod report;

pub use report::DatasetReport;

/// Accept header sent with dataset requests
pub const TSV_ACCEPT: &str = "text/tab-separated-values, text/plain";

/// Accept header sent with geometry requests
pub const GEOJSON_ACCEPT: &str = "application/geo+json, application/json";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("Upstream returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("Failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Dataset parse error: {0}")]
    Parse(#[from] RecordError),
    #[error("Geometry error: {0}")]
    Geometry(#[from] geo_resolver::GeometryError),
}

pub type Result<T> = std::result::Result<T, FetchError>;

/// Where a dataset or geometry comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
}

impl Source {
    /// `http://` and `https://` locations are URLs, anything else is a path
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Source::Url(location.to_string())
        } else {
            Source::File(PathBuf::from(location))
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Url(url) => write!(f, "{}", url),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetClientConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_sec: u64,
    /// Cache TTL in seconds (default: 300), 0 disables caching
    pub cache_ttl_sec: u64,
}

impl Default for DatasetClientConfig {
    fn default() -> Self {
        Self {
            timeout_sec: 30,
            cache_ttl_sec: 300,
        }
    }
}

/// Parsed dataset as fetched
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedDataset {
    pub source: String,
    pub columns: Vec<String>,
    pub records: Vec<SampleRecord>,
    pub warnings: Vec<ParseWarning>,
}

impl FetchedDataset {
    pub fn from_tsv(source: impl Into<String>, text: &str) -> Result<Self> {
        let source = source.into();
        let table = sample_records::parse_tsv(text)?;
        for warning in &table.warnings {
            warn!("{} line {}: {}", source, warning.line, warning.message);
        }
        Ok(Self {
            source,
            columns: table.columns,
            records: table.records,
            warnings: table.warnings,
        })
    }

    pub fn summarize(&self) -> CountrySummary {
        aggregate(self.records.iter().cloned())
    }
}

struct CacheEntry {
    dataset: Arc<FetchedDataset>,
    expires_at: Instant,
}

pub struct DatasetClient {
    config: DatasetClientConfig,
    client: reqwest::Client,
    cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl DatasetClient {
    pub fn new(config: DatasetClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_sec))
            .build()
            .map_err(FetchError::Request)?;

        Ok(Self {
            config,
            client,
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn config(&self) -> &DatasetClientConfig {
        &self.config
    }

    /// Fetch and parse a remote dataset, served from cache while fresh
    pub async fn fetch(&self, url: &str) -> Result<Arc<FetchedDataset>> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(url) {
                if entry.expires_at > Instant::now() {
                    debug!("Cache hit for {}", url);
                    return Ok(Arc::clone(&entry.dataset));
                }
            }
        }

        let text = self.get_text(url, TSV_ACCEPT).await?;
        let dataset = Arc::new(FetchedDataset::from_tsv(url, &text)?);
        info!(
            "Fetched {} rows ({} warnings) from {}",
            dataset.records.len(),
            dataset.warnings.len(),
            url
        );

        if self.config.cache_ttl_sec > 0 {
            let now = Instant::now();
            let mut cache = self.cache.write().await;
            let before = cache.len();
            cache.retain(|_, entry| entry.expires_at > now);
            if cache.len() < before {
                debug!("Evicted {} expired datasets", before - cache.len());
            }
            cache.insert(
                url.to_string(),
                CacheEntry {
                    dataset: Arc::clone(&dataset),
                    expires_at: now + Duration::from_secs(self.config.cache_ttl_sec),
                },
            );
        }

        Ok(dataset)
    }

    /// Load a dataset from a URL or a local TSV file
    pub async fn load(&self, source: &Source) -> Result<Arc<FetchedDataset>> {
        match source {
            Source::Url(url) => self.fetch(url).await,
            Source::File(path) => {
                info!("Reading dataset from {:?}", path);
                let text = tokio::fs::read_to_string(path).await?;
                Ok(Arc::new(FetchedDataset::from_tsv(source.to_string(), &text)?))
            }
        }
    }

    /// Fetch a GeoJSON FeatureCollection. Not cached.
    pub async fn fetch_geometry(&self, url: &str) -> Result<FeatureCollection> {
        let text = self.get_text(url, GEOJSON_ACCEPT).await?;
        let collection = geo_resolver::parse_geometry(&text)?;
        info!("Fetched {} geometry features from {}", collection.features.len(), url);
        Ok(collection)
    }

    pub async fn load_geometry(&self, source: &Source) -> Result<FeatureCollection> {
        match source {
            Source::Url(url) => self.fetch_geometry(url).await,
            Source::File(path) => Ok(geo_resolver::load_geometry_file(path)?),
        }
    }

    async fn get_text(&self, url: &str, accept: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, accept)
            .send()
            .await
            .map_err(FetchError::Request)?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        response.text().await.map_err(FetchError::Body)
    }

    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
    }

    /// (entries, unexpired entries)
    pub async fn cache_stats(&self) -> (usize, usize) {
        let cache = self.cache.read().await;
        let now = Instant::now();
        let total = cache.len();
        let valid = cache.values().filter(|e| e.expires_at > now).count();
        (total, valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::NamedTempFile;

    const TSV: &str = "accessionVersion\tgeoLocCountry\thostNameScientific\n\
                       PP_1.1\tPeru\tHomo sapiens\n\
                       PP_2.1\tPeru\n\
                       \n\
                       PP_3.1\tChile\tHomo sapiens\n";

    const GEOMETRY: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"name":"Peru"},"geometry":null}
    ]}"#;

    async fn samples(State(hits): State<Arc<AtomicUsize>>, headers: HeaderMap) -> (StatusCode, String) {
        hits.fetch_add(1, Ordering::SeqCst);
        let accept = headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if accept != TSV_ACCEPT {
            return (StatusCode::NOT_ACCEPTABLE, String::new());
        }
        (StatusCode::OK, TSV.to_string())
    }

    /// Serve fixtures on an ephemeral port, returning the base URL and hit counter
    async fn serve() -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/samples.tsv", get(samples))
            .route("/world.geojson", get(|| async { GEOMETRY }))
            .route("/missing.tsv", get(|| async { StatusCode::NOT_FOUND }))
            .with_state(Arc::clone(&hits));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), hits)
    }

    #[tokio::test]
    async fn test_fetch_parses_and_caches() {
        let (base, hits) = serve().await;
        let client = DatasetClient::new(DatasetClientConfig::default()).unwrap();
        let url = format!("{}/samples.tsv", base);

        let dataset = client.fetch(&url).await.unwrap();
        assert_eq!(dataset.records.len(), 3);
        assert_eq!(dataset.warnings.len(), 1);
        assert_eq!(dataset.records[1].host_name_scientific, None);

        let summary = dataset.summarize();
        assert_eq!(summary.total_count(), 3);
        assert_eq!(summary.buckets()[0].country, "Peru");
        assert_eq!(summary.buckets()[0].count, 2);

        let again = client.fetch(&url).await.unwrap();
        assert!(Arc::ptr_eq(&dataset, &again));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(client.cache_stats().await, (1, 1));

        client.clear_cache().await;
        client.fetch(&url).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_entries_evicted_on_insert() {
        let (base, _) = serve().await;
        let client = DatasetClient::new(DatasetClientConfig::default()).unwrap();
        client.cache.write().await.insert(
            "https://stale.example/old.tsv".to_string(),
            CacheEntry {
                dataset: Arc::new(FetchedDataset::from_tsv("old", TSV).unwrap()),
                expires_at: Instant::now(),
            },
        );
        assert_eq!(client.cache_stats().await, (1, 0));

        client.fetch(&format!("{}/samples.tsv", base)).await.unwrap();
        assert_eq!(client.cache_stats().await, (1, 1));
        assert!(!client.cache.read().await.contains_key("https://stale.example/old.tsv"));
    }

    #[tokio::test]
    async fn test_zero_ttl_disables_cache() {
        let (base, hits) = serve().await;
        let client = DatasetClient::new(DatasetClientConfig {
            cache_ttl_sec: 0,
            ..DatasetClientConfig::default()
        })
        .unwrap();
        let url = format!("{}/samples.tsv", base);

        client.fetch(&url).await.unwrap();
        client.fetch(&url).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(client.cache_stats().await, (0, 0));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let (base, _) = serve().await;
        let client = DatasetClient::new(DatasetClientConfig::default()).unwrap();

        let err = client.fetch(&format!("{}/missing.tsv", base)).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(s) if s == reqwest::StatusCode::NOT_FOUND));
        assert!(err.to_string().contains("404"));
        assert_eq!(client.cache_stats().await, (0, 0));
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let client = DatasetClient::new(DatasetClientConfig::default()).unwrap();
        let err = client.fetch("http://127.0.0.1:1/samples.tsv").await.unwrap_err();
        assert!(matches!(err, FetchError::Request(_)));
    }

    #[tokio::test]
    async fn test_fetch_geometry() {
        let (base, _) = serve().await;
        let client = DatasetClient::new(DatasetClientConfig::default()).unwrap();

        let source = Source::parse(&format!("{}/world.geojson", base));
        let collection = client.load_geometry(&source).await.unwrap();
        assert_eq!(collection.features.len(), 1);
    }

    #[tokio::test]
    async fn test_load_local_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(TSV.as_bytes()).unwrap();

        let client = DatasetClient::new(DatasetClientConfig::default()).unwrap();
        let source = Source::parse(file.path().to_str().unwrap());
        assert!(matches!(source, Source::File(_)));

        let dataset = client.load(&source).await.unwrap();
        assert_eq!(dataset.records.len(), 3);
    }

    #[test]
    fn test_source_parse() {
        assert_eq!(
            Source::parse("https://example.org/a.tsv"),
            Source::Url("https://example.org/a.tsv".to_string())
        );
        assert_eq!(
            Source::parse("data/a.tsv"),
            Source::File(PathBuf::from("data/a.tsv"))
        );
    }
}
