// Facade over the catalog, validator, generator and guide renderer

use rand::Rng;
use std::path::Path;
use std::sync::Arc;

use super::generator::ExampleGenerator;
use super::guide::{self, Guide};
use crate::{
    config::{catalog::ServiceCatalog, settings::EngineSettings},
    domain::ServiceSchema,
    error::{EngineError, EngineResult},
    validation::{self, Validation},
};

/// Entry point used by the bot front end.
///
/// Cheap to clone; every clone reads the same catalog snapshot.
#[derive(Debug, Clone)]
pub struct NotificationUrlService {
    catalog: Arc<ServiceCatalog>,
    settings: EngineSettings,
}

impl NotificationUrlService {
    pub fn new(catalog: Arc<ServiceCatalog>, settings: EngineSettings) -> Self {
        Self { catalog, settings }
    }

    /// Load a catalog file, or the bundled catalog when `path` is `None`
    pub fn from_path(path: Option<&Path>, settings: EngineSettings) -> EngineResult<Self> {
        let catalog = ServiceCatalog::load(path).map_err(|e| EngineError::Catalog(format!("{:#}", e)))?;
        Ok(Self::new(Arc::new(catalog), settings))
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn service_names(&self) -> Vec<String> {
        self.catalog.list_service_names()
    }

    pub fn templates(&self, service_name: &str) -> Vec<String> {
        self.catalog.get_templates(service_name)
    }

    pub fn schema(&self, service_name: &str) -> Option<&ServiceSchema> {
        self.catalog.get_schema(service_name)
    }

    pub fn validate(&self, url: &str, service_name: &str) -> Validation {
        validation::validate(&self.catalog, url, service_name)
    }

    pub fn generate(&self, service_name: &str, template: Option<&str>) -> EngineResult<String> {
        self.generate_with(service_name, template, &mut rand::rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(
        &self,
        service_name: &str,
        template: Option<&str>,
        rng: &mut R,
    ) -> EngineResult<String> {
        let schema = self
            .schema(service_name)
            .ok_or_else(|| EngineError::UnknownService(service_name.to_string()))?;
        ExampleGenerator::new(schema, &self.settings).generate(template, rng)
    }

    pub fn build_guide(&self, service_name: &str) -> Option<Guide> {
        self.build_guide_with(service_name, &mut rand::rng())
    }

    pub fn build_guide_with<R: Rng + ?Sized>(
        &self,
        service_name: &str,
        rng: &mut R,
    ) -> Option<Guide> {
        self.schema(service_name)
            .map(|schema| guide::build_guide(schema, &self.settings, rng))
    }

    /// HTML guide for the service; unknown services get the missing-service fragment
    pub fn render_guide(&self, service_name: &str) -> EngineResult<String> {
        match self.build_guide(service_name) {
            Some(guide) => guide::render(&guide),
            None => {
                tracing::debug!(service = service_name, "No guide for unknown service");
                guide::render_missing(service_name)
            }
        }
    }
}
