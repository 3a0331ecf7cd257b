// Common test utilities shared across test files

use std::sync::Arc;

use uvlbot::config::{catalog::ServiceCatalog, formats::YamlFormat, settings::EngineSettings};
use uvlbot::services::NotificationUrlService;

/// Small catalog covering the scenarios the integration tests rely on
pub const TEST_CATALOG: &str = r#"
schemas:
  - service_name: Dummy
    details:
      templates:
        - 'dummy://{host}/{token}'
      tokens:
        host: { name: Host, type: string }
        token: { name: Token, type: string, regex: ['^[A-Za-z0-9]{8,12}$'] }
  - service_name: Bounded
    protocols: [bnd]
    details:
      templates:
        - '{schema}://{host}:{level}'
      tokens:
        host: { name: Host, required: true }
        level: { name: Level, type: int, min: 1, max: 5 }
  - service_name: Lists
    protocols: [lst]
    details:
      templates:
        - '{schema}://{host}/{names}'
      tokens:
        host: { name: Host, required: true }
        names: { name: Names, type: 'list:string', delim: [','], regex: ['^[a-z]+$'] }
"#;

/// Catalog built from [`TEST_CATALOG`]
#[allow(dead_code)]
pub fn test_catalog() -> ServiceCatalog {
    ServiceCatalog::parse(TEST_CATALOG, &YamlFormat).expect("Test catalog must parse")
}

/// Facade over [`TEST_CATALOG`] with default settings
#[allow(dead_code)]
pub fn test_service() -> NotificationUrlService {
    NotificationUrlService::new(Arc::new(test_catalog()), EngineSettings::default())
}

/// Facade over the catalog shipped with the crate
#[allow(dead_code)]
pub fn bundled_service() -> NotificationUrlService {
    let catalog = ServiceCatalog::bundled().expect("Bundled catalog must parse");
    NotificationUrlService::new(Arc::new(catalog), EngineSettings::default())
}
