// Catalog file formats

use anyhow::Result;
use std::path::Path;

use super::yml_settings::CatalogSettings;

/// Strategy trait for catalog file formats
pub trait CatalogFormat: Send + Sync {
    fn parse(&self, content: &str) -> Result<CatalogSettings>;
    fn file_extensions(&self) -> &'static [&'static str];
}

/// YAML catalog (the bundled format)
pub struct YamlFormat;

impl CatalogFormat for YamlFormat {
    fn parse(&self, content: &str) -> Result<CatalogSettings> {
        Ok(serde_yaml::from_str(content)?)
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["yml", "yaml"]
    }
}

/// JSON catalog, as dumped straight from the dispatch library
pub struct JsonFormat;

impl CatalogFormat for JsonFormat {
    fn parse(&self, content: &str) -> Result<CatalogSettings> {
        Ok(serde_json::from_str(content)?)
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["json"]
    }
}

/// Pick a format from the file extension, falling back to YAML
pub fn format_for_path(path: &Path) -> &'static dyn CatalogFormat {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if JsonFormat.file_extensions().contains(&extension.as_str()) {
        &JsonFormat
    } else {
        &YamlFormat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_for_path() {
        assert_eq!(
            format_for_path(Path::new("catalog.json")).file_extensions(),
            &["json"]
        );
        assert_eq!(
            format_for_path(Path::new("catalog.YAML")).file_extensions(),
            &["yml", "yaml"]
        );
        assert_eq!(
            format_for_path(Path::new("catalog")).file_extensions(),
            &["yml", "yaml"]
        );
    }

    #[test]
    fn test_json_and_yaml_parse_same_shape() {
        let json = r#"{"schemas": [{"service_name": "X", "details": {"templates": ["x://{host}"], "tokens": {"host": {"name": "Host"}}}}]}"#;
        let yaml = "schemas:\n  - service_name: X\n    details:\n      templates: ['x://{host}']\n      tokens:\n        host:\n          name: Host\n";

        let from_json = JsonFormat.parse(json).unwrap();
        let from_yaml = YamlFormat.parse(yaml).unwrap();
        assert_eq!(from_json, from_yaml);
    }
}
