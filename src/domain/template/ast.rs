// Abstract Syntax Tree types for service URL templates

/// Represents a parsed template as a list of parts
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub source: String,
    pub parts: Vec<TemplatePart>,
}

impl Template {
    pub fn new(source: &str, parts: Vec<TemplatePart>) -> Self {
        Self {
            source: source.to_string(),
            parts,
        }
    }

    /// Get all token names in this template, in order of appearance
    pub fn tokens(&self) -> Vec<&str> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                TemplatePart::Token(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn has_token(&self, name: &str) -> bool {
        self.tokens().contains(&name)
    }

    /// Substitute every placeholder using `value_for`, leaving literals untouched
    pub fn substitute<F>(&self, mut value_for: F) -> String
    where
        F: FnMut(&str) -> String,
    {
        let mut result = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Literal(s) => result.push_str(s),
                TemplatePart::Token(name) => result.push_str(&value_for(name)),
            }
        }
        result
    }
}

/// A template consists of literal strings and `{token}` placeholders
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    Token(String),
}
