// Template to anchored regex compilation, memoised by template text

use anyhow::{Context, Result};
use dashmap::DashMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;

use super::ast::{Template, TemplatePart};
use super::parser::TemplateParser;

/// Capture used for every placeholder: one or more characters, braces excluded
const TOKEN_CAPTURE: &str = "([^{}]+)";

lazy_static! {
    static ref PATTERN_CACHE: DashMap<String, Arc<CompiledTemplate>> = DashMap::new();
}

/// A parsed template together with its anchored matching pattern
#[derive(Debug)]
pub struct CompiledTemplate {
    template: Template,
    pattern: Regex,
}

impl CompiledTemplate {
    /// Compile `source`, reusing the process-wide entry when the same text was seen before
    pub fn compile(source: &str) -> Result<Arc<Self>> {
        if let Some(hit) = PATTERN_CACHE.get(source) {
            return Ok(Arc::clone(hit.value()));
        }

        let template = TemplateParser::parse(source)
            .with_context(|| format!("Invalid template '{}'", source))?;
        let pattern = Regex::new(&to_pattern(&template))
            .with_context(|| format!("Failed to compile template '{}'", source))?;

        let compiled = Arc::new(Self { template, pattern });
        let entry = PATTERN_CACHE
            .entry(source.to_string())
            .or_insert(compiled);
        Ok(Arc::clone(entry.value()))
    }

    pub fn source(&self) -> &str {
        &self.template.source
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Match the whole URL, returning `(token, captured value)` pairs in template order
    pub fn match_url<'s, 'u>(&'s self, url: &'u str) -> Option<Vec<(&'s str, &'u str)>> {
        let caps = self.pattern.captures(url)?;
        let pairs = self
            .template
            .tokens()
            .into_iter()
            .zip(caps.iter().skip(1))
            .filter_map(|(name, m)| m.map(|m| (name, m.as_str())))
            .collect();
        Some(pairs)
    }
}

/// Turn a template into an anchored pattern: literals escaped, placeholders captured
pub fn to_pattern(template: &Template) -> String {
    let mut pattern = String::from("^");
    for part in &template.parts {
        match part {
            TemplatePart::Literal(s) => pattern.push_str(&regex::escape(s)),
            TemplatePart::Token(_) => pattern.push_str(TOKEN_CAPTURE),
        }
    }
    pattern.push('$');
    pattern
}
