//! Gateway settings read from the environment

use dataset_fetch::{DatasetClientConfig, Source};
use sample_records::DEFAULT_SEQUENCE_BASE_URL;
use std::path::PathBuf;

pub const DEFAULT_PORT: &str = "18700";
pub const DEFAULT_GEOMETRY: &str = "data/custom.geo-midi.json";
pub const DEFAULT_SESSION_IDLE_SEC: u64 = 3600;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: String,
    /// Region GeoJSON, file path or http(s) URL
    pub geometry: Source,
    /// Built UI to serve under `/`, if any
    pub static_dir: Option<PathBuf>,
    pub client: DatasetClientConfig,
    /// Accession links point at `{base}/seq/{accession}`
    pub sequence_base_url: String,
    /// Viewer sessions idle this long are pruned, 0 disables pruning
    pub session_idle_sec: u64,
}

impl GatewayConfig {
    /// `ATLAS_GATEWAY_PORT` (or `PORT`), `ATLAS_GEOMETRY`, `ATLAS_STATIC_DIR`,
    /// `ATLAS_FETCH_TIMEOUT_SEC`, `ATLAS_CACHE_TTL_SEC`, `ATLAS_SEQUENCE_BASE_URL`,
    /// `ATLAS_SESSION_IDLE_SEC`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = DatasetClientConfig::default();
        let seconds = |key: &str, default: u64| {
            var(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        Self {
            port: var("ATLAS_GATEWAY_PORT")
                .or_else(|| var("PORT"))
                .unwrap_or_else(|| DEFAULT_PORT.to_string()),
            geometry: Source::parse(&var("ATLAS_GEOMETRY").unwrap_or_else(|| DEFAULT_GEOMETRY.to_string())),
            static_dir: var("ATLAS_STATIC_DIR").map(PathBuf::from),
            client: DatasetClientConfig {
                timeout_sec: seconds("ATLAS_FETCH_TIMEOUT_SEC", defaults.timeout_sec),
                cache_ttl_sec: seconds("ATLAS_CACHE_TTL_SEC", defaults.cache_ttl_sec),
            },
            sequence_base_url: var("ATLAS_SEQUENCE_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_SEQUENCE_BASE_URL.to_string()),
            session_idle_sec: seconds("ATLAS_SESSION_IDLE_SEC", DEFAULT_SESSION_IDLE_SEC),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> GatewayConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GatewayConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = config(&[]);
        assert_eq!(c.port, "18700");
        assert_eq!(c.geometry, Source::File(PathBuf::from(DEFAULT_GEOMETRY)));
        assert!(c.static_dir.is_none());
        assert_eq!(c.client.timeout_sec, 30);
        assert_eq!(c.client.cache_ttl_sec, 300);
        assert_eq!(c.sequence_base_url, "https://pathoplexus.org");
        assert_eq!(c.session_idle_sec, 3600);
    }

    #[test]
    fn test_overrides() {
        let c = config(&[
            ("PORT", "9000"),
            ("ATLAS_GEOMETRY", "https://example.org/world.geojson"),
            ("ATLAS_CACHE_TTL_SEC", "0"),
            ("ATLAS_FETCH_TIMEOUT_SEC", "oops"),
            ("ATLAS_SEQUENCE_BASE_URL", "https://seq.example.org/"),
            ("ATLAS_SESSION_IDLE_SEC", "900"),
        ]);
        assert_eq!(c.port, "9000");
        assert!(matches!(c.geometry, Source::Url(_)));
        assert_eq!(c.client.cache_ttl_sec, 0);
        assert_eq!(c.client.timeout_sec, 30);
        assert_eq!(c.sequence_base_url, "https://seq.example.org");
        assert_eq!(c.session_idle_sec, 900);
    }

    #[test]
    fn test_gateway_port_wins_over_port() {
        let c = config(&[("PORT", "9000"), ("ATLAS_GATEWAY_PORT", "9100")]);
        assert_eq!(c.port, "9100");
    }
}
