use anyhow::{bail, Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use super::formats::{format_for_path, CatalogFormat, YamlFormat};
use super::yml_settings::{CatalogSettings, Scalar, ServiceSettings, TokenSettings};
use crate::domain::{
    template::CompiledTemplate, ServiceSchema, TokenDescriptor, TokenKind, TokenPattern,
    SCHEMA_TOKEN,
};

const BUNDLED_CATALOG: &str = include_str!("../../services.yml");

/// Read-only snapshot of every usable service schema, keyed by service name
#[derive(Debug, Default)]
pub struct ServiceCatalog {
    services: BTreeMap<String, ServiceSchema>,
}

impl ServiceCatalog {
    /// Build the snapshot, excluding (and logging) services that cannot be validated
    pub fn from_settings(settings: CatalogSettings) -> Self {
        let mut services = BTreeMap::new();

        for service in settings.schemas {
            let name = service.service_name.clone();
            if services.contains_key(&name) {
                tracing::warn!(service = %name, "Duplicate service in catalog, keeping the first");
                continue;
            }

            match build_schema(service) {
                Ok(schema) => {
                    services.insert(name, schema);
                }
                Err(e) => {
                    let reason = format!("{:#}", e);
                    tracing::warn!(service = %name, %reason, "Excluding service from catalog");
                }
            }
        }

        tracing::info!(services = services.len(), "Service catalog loaded");
        Self { services }
    }

    pub fn parse(content: &str, format: &dyn CatalogFormat) -> Result<Self> {
        let settings = format
            .parse(content)
            .context("Failed to parse service catalog")?;
        Ok(Self::from_settings(settings))
    }

    /// The catalog compiled into the crate
    pub fn bundled() -> Result<Self> {
        Self::parse(BUNDLED_CATALOG, &YamlFormat)
    }

    /// Load from `path`, or the bundled catalog when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Could not read catalog {}", path.display()))?;
                Self::parse(&content, format_for_path(path))
            }
            None => Self::bundled(),
        }
    }

    /// Sorted names of every service that can be validated and generated
    pub fn list_service_names(&self) -> Vec<String> {
        self.services.keys().cloned().collect()
    }

    pub fn get_schema(&self, service_name: &str) -> Option<&ServiceSchema> {
        self.services.get(service_name)
    }

    pub fn get_templates(&self, service_name: &str) -> Vec<String> {
        self.get_schema(service_name)
            .map(ServiceSchema::template_sources)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

fn build_schema(settings: ServiceSettings) -> Result<ServiceSchema> {
    let ServiceSettings {
        service_name,
        service_url,
        setup_url,
        protocols,
        secure_protocols,
        details,
    } = settings;

    if details.templates.is_empty() {
        bail!("Service declares no templates");
    }
    if details.tokens.is_empty() {
        bail!("Service declares no tokens");
    }

    let templates = details
        .templates
        .iter()
        .map(|source| CompiledTemplate::compile(source))
        .collect::<Result<Vec<Arc<CompiledTemplate>>>>()?;

    let schemes: Vec<String> = protocols
        .iter()
        .chain(secure_protocols.iter())
        .cloned()
        .collect();

    let mut raw_tokens = details.tokens;
    let uses_schema = templates
        .iter()
        .any(|t| t.template().has_token(SCHEMA_TOKEN));
    if uses_schema && !raw_tokens.contains_key(SCHEMA_TOKEN) {
        raw_tokens.insert(
            SCHEMA_TOKEN.to_string(),
            TokenSettings {
                name: Some("Schema".to_string()),
                kind: Some("choice:string".to_string()),
                required: true,
                values: schemes.iter().cloned().map(Scalar::Str).collect(),
                ..Default::default()
            },
        );
    }

    let position: HashMap<String, usize> = raw_tokens
        .keys()
        .enumerate()
        .map(|(i, key)| (key.clone(), i))
        .collect();

    for template in &templates {
        for token in template.template().tokens() {
            if !position.contains_key(token) {
                bail!(
                    "Template '{}' references undeclared token '{}'",
                    template.source(),
                    token
                );
            }
        }
    }

    let tokens = raw_tokens
        .into_iter()
        .map(|(key, raw)| build_token(key, raw, &position, &schemes))
        .collect::<Result<Vec<_>>>()?;

    Ok(ServiceSchema::new(
        service_name,
        service_url,
        setup_url,
        protocols,
        secure_protocols,
        templates,
        tokens,
    ))
}

fn build_token(
    key: String,
    raw: TokenSettings,
    position: &HashMap<String, usize>,
    schemes: &[String],
) -> Result<TokenDescriptor> {
    let resolve = |name: &str| {
        position
            .get(name)
            .copied()
            .with_context(|| format!("Token '{}' references undeclared token '{}'", key, name))
    };

    let alias_of = raw.alias_of.as_deref().map(resolve).transpose()?;
    let group = raw
        .group
        .iter()
        .map(|name| resolve(name))
        .collect::<Result<Vec<_>>>()?;

    let kind = TokenKind::parse(raw.kind.as_deref().unwrap_or("string"));

    let pattern = raw.regex.first().map(|source| {
        let flags = raw.regex.get(1).map(String::as_str).unwrap_or("");
        TokenPattern::new(source, flags)
    });

    let mut values: Vec<String> = raw.values.iter().map(ToString::to_string).collect();
    if values.is_empty() {
        if kind == TokenKind::Bool {
            values = vec!["true".to_string(), "false".to_string()];
        } else if key == SCHEMA_TOKEN {
            values = schemes.to_vec();
        }
    }

    let mut delim = raw.delim;
    if kind.is_list() && delim.is_empty() {
        delim.push(",".to_string());
    }

    let min = finite_bound(&key, "min", raw.min);
    let max = finite_bound(&key, "max", raw.max);

    Ok(TokenDescriptor {
        name: raw.name.unwrap_or_else(|| key.clone()),
        key,
        kind,
        required: raw.required,
        private: raw.private,
        min,
        max,
        pattern,
        values,
        delim,
        alias_of,
        group,
    })
}

/// Infinite or NaN bounds constrain nothing
fn finite_bound(key: &str, which: &str, bound: Option<f64>) -> Option<f64> {
    match bound {
        Some(value) if !value.is_finite() => {
            tracing::warn!(token = key, bound = which, %value, "Ignoring non-finite token bound");
            None
        }
        other => other,
    }
}
