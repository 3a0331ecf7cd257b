// Service schema model: per-service URL templates and typed token descriptors

use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::template::CompiledTemplate;

/// Name of the placeholder standing for the URL scheme
pub const SCHEMA_TOKEN: &str = "schema";

/// Render a bound without a trailing `.0` when it is integral
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Token type, parsed once when the schema is ingested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Int,
    Float,
    Str,
    Bool,
    ListInt,
    ListFloat,
    ListStr,
    /// `choice:<kind>`; the inner kind is kept for display only
    Choice(String),
    /// Anything else; validation reports it by its raw text
    Unknown(String),
}

impl TokenKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "int" => TokenKind::Int,
            "float" => TokenKind::Float,
            "string" => TokenKind::Str,
            "bool" => TokenKind::Bool,
            "list:int" => TokenKind::ListInt,
            "list:float" => TokenKind::ListFloat,
            "list:string" => TokenKind::ListStr,
            other => match other.strip_prefix("choice:") {
                Some(kind) => TokenKind::Choice(kind.to_string()),
                None => TokenKind::Unknown(other.to_string()),
            },
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(
            self,
            TokenKind::ListInt | TokenKind::ListFloat | TokenKind::ListStr
        )
    }

    /// Human readable category used in guides
    pub fn category(&self) -> &'static str {
        match self {
            TokenKind::Int => "Integer",
            TokenKind::Float => "Float",
            TokenKind::Str => "String",
            TokenKind::Bool => "Boolean",
            TokenKind::ListInt => "List of integers",
            TokenKind::ListFloat => "List of floats",
            TokenKind::ListStr => "List of strings",
            TokenKind::Choice(_) => "Choice",
            TokenKind::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int => write!(f, "int"),
            TokenKind::Float => write!(f, "float"),
            TokenKind::Str => write!(f, "string"),
            TokenKind::Bool => write!(f, "bool"),
            TokenKind::ListInt => write!(f, "list:int"),
            TokenKind::ListFloat => write!(f, "list:float"),
            TokenKind::ListStr => write!(f, "list:string"),
            TokenKind::Choice(kind) => write!(f, "choice:{}", kind),
            TokenKind::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

/// A token's regex constraint.
///
/// A pattern that does not compile is kept for display but constrains nothing.
#[derive(Debug, Clone)]
pub struct TokenPattern {
    pub source: String,
    pub case_insensitive: bool,
    regex: Option<Regex>,
}

impl TokenPattern {
    pub fn new(source: &str, flags: &str) -> Self {
        let case_insensitive = flags.contains('i');
        let regex = match RegexBuilder::new(&format!("^(?:{})$", source))
            .case_insensitive(case_insensitive)
            .build()
        {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::warn!(pattern = source, error = %e, "Ignoring malformed token pattern");
                None
            }
        };

        Self {
            source: source.to_string(),
            case_insensitive,
            regex,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.regex.is_some()
    }

    /// Full-value match; an unusable pattern accepts everything
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.as_ref().map_or(true, |r| r.is_match(value))
    }
}

/// Describes one placeholder of a service schema
#[derive(Debug, Clone)]
pub struct TokenDescriptor {
    pub key: String,
    pub name: String,
    pub kind: TokenKind,
    pub required: bool,
    pub private: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub pattern: Option<TokenPattern>,
    pub values: Vec<String>,
    pub delim: Vec<String>,
    /// Index of the token this one defers to
    pub alias_of: Option<usize>,
    /// Indices of tokens whose patterns are tried disjunctively on list elements
    pub group: Vec<usize>,
}

impl TokenDescriptor {
    /// `Name (key)`, the prefix of every validation message about this token
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.key)
    }
}

/// Declarative description of one notification service's acceptable URLs
#[derive(Debug)]
pub struct ServiceSchema {
    pub service_name: String,
    pub service_url: Option<String>,
    pub setup_url: Option<String>,
    pub protocols: Vec<String>,
    pub secure_protocols: Vec<String>,
    templates: Vec<Arc<CompiledTemplate>>,
    tokens: Vec<TokenDescriptor>,
    index: HashMap<String, usize>,
}

impl ServiceSchema {
    pub(crate) fn new(
        service_name: String,
        service_url: Option<String>,
        setup_url: Option<String>,
        protocols: Vec<String>,
        secure_protocols: Vec<String>,
        templates: Vec<Arc<CompiledTemplate>>,
        tokens: Vec<TokenDescriptor>,
    ) -> Self {
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| (token.key.clone(), i))
            .collect();

        Self {
            service_name,
            service_url,
            setup_url,
            protocols,
            secure_protocols,
            templates,
            tokens,
            index,
        }
    }

    pub fn templates(&self) -> &[Arc<CompiledTemplate>] {
        &self.templates
    }

    pub fn template_sources(&self) -> Vec<String> {
        self.templates
            .iter()
            .map(|t| t.source().to_string())
            .collect()
    }

    pub fn find_template(&self, source: &str) -> Option<&Arc<CompiledTemplate>> {
        self.templates.iter().find(|t| t.source() == source)
    }

    pub fn tokens(&self) -> &[TokenDescriptor] {
        &self.tokens
    }

    pub fn token(&self, key: &str) -> Option<&TokenDescriptor> {
        self.index.get(key).map(|&i| &self.tokens[i])
    }

    /// Look up a token and follow its alias one level
    pub fn resolve(&self, key: &str) -> Option<&TokenDescriptor> {
        self.token(key).map(|token| self.resolve_descriptor(token))
    }

    pub fn resolve_descriptor<'a>(&'a self, token: &'a TokenDescriptor) -> &'a TokenDescriptor {
        match token.alias_of {
            Some(i) => &self.tokens[i],
            None => token,
        }
    }

    /// Resolved descriptors of a token's group members
    pub fn group_members<'a>(
        &'a self,
        token: &'a TokenDescriptor,
    ) -> impl Iterator<Item = &'a TokenDescriptor> + 'a {
        token
            .group
            .iter()
            .map(move |&i| self.resolve_descriptor(&self.tokens[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_kinds() {
        assert_eq!(TokenKind::parse("int"), TokenKind::Int);
        assert_eq!(TokenKind::parse("float"), TokenKind::Float);
        assert_eq!(TokenKind::parse("string"), TokenKind::Str);
        assert_eq!(TokenKind::parse("bool"), TokenKind::Bool);
        assert_eq!(TokenKind::parse("list:int"), TokenKind::ListInt);
        assert_eq!(TokenKind::parse("list:float"), TokenKind::ListFloat);
        assert_eq!(TokenKind::parse("list:string"), TokenKind::ListStr);
        assert_eq!(
            TokenKind::parse("choice:string"),
            TokenKind::Choice("string".to_string())
        );
        assert_eq!(
            TokenKind::parse("matrix"),
            TokenKind::Unknown("matrix".to_string())
        );
    }

    #[test]
    fn test_token_kind_display_round_trips() {
        for raw in ["int", "list:string", "choice:int", "weird"] {
            assert_eq!(TokenKind::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-3.0), "-3");
        assert_eq!(format_number(0.25), "0.25");
    }

    #[test]
    fn test_pattern_is_full_match() {
        let pattern = TokenPattern::new("[a-z]+", "");
        assert!(pattern.is_match("abc"));
        assert!(!pattern.is_match("abc1"));
        assert!(!pattern.is_match("ABC"));
    }

    #[test]
    fn test_pattern_case_insensitive_flag() {
        let pattern = TokenPattern::new("^[a-z]+$", "i");
        assert!(pattern.case_insensitive);
        assert!(pattern.is_match("ABC"));
    }

    #[test]
    fn test_malformed_pattern_constrains_nothing() {
        let pattern = TokenPattern::new("([a-z", "");
        assert!(!pattern.is_usable());
        assert!(pattern.is_match("anything at all"));
    }
}
