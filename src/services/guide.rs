// Guide renderer - documentation fragment for one notification service

use askama::Template;
use rand::Rng;

use super::generator::ExampleGenerator;
use crate::{
    config::settings::EngineSettings,
    domain::{format_number, ServiceSchema, TokenDescriptor, TokenKind, SCHEMA_TOKEN},
    error::EngineResult,
};

/// Everything a guide page shows, before it is turned into HTML
#[derive(Debug, Clone)]
pub struct Guide {
    pub service_name: String,
    /// Templates with the scheme substituted, one line per allowed scheme
    pub template_lines: Vec<String>,
    /// Sorted required-first, then by label
    pub tokens: Vec<TokenRow>,
    pub examples: Vec<String>,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenRow {
    pub name: String,
    pub key: String,
    pub required: bool,
    pub private: bool,
    pub category: String,
    pub constraints: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub label: String,
    pub url: String,
}

#[derive(Template)]
#[template(path = "guide.html")]
struct GuideTemplate<'a> {
    guide: &'a Guide,
}

#[derive(Template)]
#[template(path = "partials/guide_missing.html")]
struct GuideMissingTemplate<'a> {
    service_name: &'a str,
}

pub fn build_guide<R: Rng + ?Sized>(
    schema: &ServiceSchema,
    settings: &EngineSettings,
    rng: &mut R,
) -> Guide {
    let generator = ExampleGenerator::new(schema, settings);
    let mut examples = Vec::new();
    // One example per template in turn, so each URL shape gets shown
    for template in schema.templates().iter().cycle().take(settings.guide_examples) {
        match generator.generate(Some(template.source()), rng) {
            Ok(url) => examples.push(url),
            Err(e) => {
                tracing::warn!(service = %schema.service_name, error = %e, "Skipping guide example");
            }
        }
    }

    let mut links = Vec::new();
    if let Some(url) = &schema.service_url {
        links.push(Link {
            label: "Service website".to_string(),
            url: url.clone(),
        });
    }
    if let Some(url) = &schema.setup_url {
        links.push(Link {
            label: "Setup instructions".to_string(),
            url: url.clone(),
        });
    }

    Guide {
        service_name: schema.service_name.clone(),
        template_lines: template_lines(schema),
        tokens: token_rows(schema),
        examples,
        links,
    }
}

pub fn render(guide: &Guide) -> EngineResult<String> {
    Ok(GuideTemplate { guide }.render()?)
}

pub fn render_missing(service_name: &str) -> EngineResult<String> {
    Ok(GuideMissingTemplate { service_name }.render()?)
}

fn template_lines(schema: &ServiceSchema) -> Vec<String> {
    let schemes = schema
        .token(SCHEMA_TOKEN)
        .map(|token| token.values.as_slice())
        .unwrap_or_default();
    let placeholder = format!("{{{}}}", SCHEMA_TOKEN);

    let mut lines = Vec::new();
    for template in schema.templates() {
        let source = template.source();
        if template.template().has_token(SCHEMA_TOKEN) && !schemes.is_empty() {
            lines.extend(schemes.iter().map(|scheme| source.replace(&placeholder, scheme)));
        } else {
            lines.push(source.to_string());
        }
    }
    lines
}

fn token_rows(schema: &ServiceSchema) -> Vec<TokenRow> {
    let mut rows: Vec<TokenRow> = schema
        .tokens()
        .iter()
        .map(|token| {
            let resolved = schema.resolve_descriptor(token);
            let mut constraints = Vec::new();
            if token.alias_of.is_some() {
                constraints.push(format!("alias of {}", resolved.name));
            }
            constraints.extend(describe_constraints(schema, resolved));

            TokenRow {
                name: token.name.clone(),
                key: token.key.clone(),
                required: token.required,
                private: token.private || resolved.private,
                category: resolved.kind.category().to_string(),
                constraints: constraints.join("; "),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.required
            .cmp(&a.required)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    rows
}

fn describe_constraints(schema: &ServiceSchema, token: &TokenDescriptor) -> Vec<String> {
    let mut parts = Vec::new();

    match &token.kind {
        TokenKind::Int | TokenKind::Float | TokenKind::ListInt | TokenKind::ListFloat => {
            match (token.min, token.max) {
                (Some(min), Some(max)) => parts.push(format!(
                    "{} to {}",
                    format_number(min),
                    format_number(max)
                )),
                (Some(min), None) => parts.push(format!("at least {}", format_number(min))),
                (None, Some(max)) => parts.push(format!("at most {}", format_number(max))),
                (None, None) => {}
            }
        }
        TokenKind::Bool | TokenKind::Choice(_) => {
            parts.push(format!("one of: {}", token.values.join(", ")));
        }
        TokenKind::Unknown(raw) => parts.push(format!("unsupported type '{}'", raw)),
        TokenKind::Str | TokenKind::ListStr => {}
    }

    if token.kind == TokenKind::ListStr && !token.group.is_empty() {
        let members = schema
            .group_members(token)
            .map(|member| member.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("each element is one of: {}", members));
    } else if let Some(pattern) = &token.pattern {
        let flag = if pattern.case_insensitive {
            " (case-insensitive)"
        } else {
            ""
        };
        parts.push(format!("regex {}{}", pattern.source, flag));
    }

    if token.kind.is_list() {
        let delims = token
            .delim
            .iter()
            .map(|d| format!("'{}'", d))
            .collect::<Vec<_>>()
            .join(", ");
        parts.push(format!("separated by {}", delims));
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{catalog::ServiceCatalog, formats::YamlFormat};
    use rand::{rngs::StdRng, SeedableRng};

    fn catalog() -> ServiceCatalog {
        ServiceCatalog::parse(
            r#"
schemas:
  - service_name: Sample
    service_url: https://sample.example
    setup_url: https://sample.example/setup
    protocols: [smp]
    secure_protocols: [smps]
    details:
      templates:
        - '{schema}://{host}:{port}'
        - 'fixed://{host}'
      tokens:
        host: { name: host name, required: true }
        port: { name: Port, type: int, min: 1, max: 65535 }
        apikey: { name: API Key, private: true, regex: ['^[a-z]{8}$', 'i'] }
        key: { name: Key alias, alias_of: apikey }
"#,
            &YamlFormat,
        )
        .unwrap()
    }

    #[test]
    fn test_template_lines_expand_schema() {
        let catalog = catalog();
        let lines = template_lines(catalog.get_schema("Sample").unwrap());
        assert_eq!(
            lines,
            vec![
                "smp://{host}:{port}",
                "smps://{host}:{port}",
                "fixed://{host}",
            ]
        );
    }

    #[test]
    fn test_token_rows_sorted_required_first() {
        let catalog = catalog();
        let rows = token_rows(catalog.get_schema("Sample").unwrap());
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["host name", "Schema", "API Key", "Key alias", "Port"]);
    }

    #[test]
    fn test_constraint_summaries() {
        let catalog = catalog();
        let rows = token_rows(catalog.get_schema("Sample").unwrap());
        let find = |key: &str| rows.iter().find(|r| r.key == key).unwrap();

        assert_eq!(find("port").constraints, "1 to 65535");
        assert_eq!(find("port").category, "Integer");
        assert_eq!(find("schema").constraints, "one of: smp, smps");
        assert_eq!(find("apikey").constraints, "regex ^[a-z]{8}$ (case-insensitive)");
        assert!(find("key").constraints.starts_with("alias of API Key"));
        assert!(find("key").private);
    }

    #[test]
    fn test_render_has_sections() {
        let catalog = catalog();
        let schema = catalog.get_schema("Sample").unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        let guide = build_guide(schema, &EngineSettings::default(), &mut rng);
        assert_eq!(guide.examples.len(), 3);

        let html = render(&guide).unwrap();
        for header in ["Templates", "Tokens", "Examples", "Information"] {
            assert!(html.contains(&format!("<h2>{}</h2>", header)), "missing {}", header);
        }
        assert!(html.contains("class=\"sortable\""));
        assert!(html.contains("Setup instructions"));
    }

    #[test]
    fn test_examples_cover_each_template() {
        let catalog = catalog();
        let schema = catalog.get_schema("Sample").unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let guide = build_guide(schema, &EngineSettings::default(), &mut rng);

        assert_eq!(guide.examples.len(), 3);
        assert!(schema.templates()[0].match_url(&guide.examples[0]).is_some());
        assert!(guide.examples[1].starts_with("fixed://"));
        assert!(schema.templates()[0].match_url(&guide.examples[2]).is_some());
    }

    #[test]
    fn test_render_missing() {
        let html = render_missing("Nope").unwrap();
        assert!(html.contains("No documentation available"));
        assert!(html.contains("Nope"));
    }
}
