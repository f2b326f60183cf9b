//! Geometry loading from GeoJSON text or files

use crate::{GeometryError, Result};
use geojson::{FeatureCollection, GeoJson};
use std::fs;
use std::path::Path;
use tracing::info;

/// Parse GeoJSON text that must hold a FeatureCollection
pub fn parse_geometry(text: &str) -> Result<FeatureCollection> {
    let geojson: GeoJson = text.parse()?;
    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        GeoJson::Feature(_) => Err(GeometryError::NotACollection("Feature")),
        GeoJson::Geometry(_) => Err(GeometryError::NotACollection("Geometry")),
    }
}

/// Load a FeatureCollection from a GeoJSON file
pub fn load_geometry_file(path: impl AsRef<Path>) -> Result<FeatureCollection> {
    let path = path.as_ref();
    info!("Loading geometry from {:?}", path);

    let text = fs::read_to_string(path)?;
    let collection = parse_geometry(&text)?;

    info!("Loaded {} geometry features", collection.features.len());
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const COLLECTION: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"name": "France", "name_en": "France"}, "geometry": null},
            {"type": "Feature", "properties": {"name": "España"}, "geometry": null}
        ]
    }"#;

    #[test]
    fn test_load_geometry_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(COLLECTION.as_bytes()).unwrap();

        let collection = load_geometry_file(file.path()).unwrap();
        assert_eq!(collection.features.len(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_geometry_file("/nonexistent/geo.json").unwrap_err();
        assert!(matches!(err, GeometryError::Io(_)));
    }

    #[test]
    fn test_rejects_non_collection() {
        let feature = r#"{"type": "Feature", "properties": {}, "geometry": null}"#;
        let err = parse_geometry(feature).unwrap_err();
        assert!(matches!(err, GeometryError::NotACollection("Feature")));

        assert!(matches!(parse_geometry("not json"), Err(GeometryError::Parse(_))));
    }
}
