// Validation of notification URLs against service schemas
// Every template is tried and every token violation collected before a verdict is reached

use lazy_static::lazy_static;
use regex::Regex;

use crate::config::catalog::ServiceCatalog;
use crate::domain::{
    format_number, template::CompiledTemplate, ServiceSchema, TokenDescriptor, TokenKind,
};

/// URL of the dummy service used by bots that must never dispatch anything
pub const DUMMY_URL: &str = "test://test/test";

pub const NO_TEMPLATE_MATCH: &str = "URL does not match any template";

lazy_static! {
    static ref INT_VALUE: Regex = Regex::new(r"^[0-9]+$").unwrap(/* known good */);
    static ref FLOAT_VALUE: Regex = Regex::new(r"^[0-9]+(\.[0-9]+)?$").unwrap(/* known good */);
}

/// Outcome of validating one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Accepted,
    Rejected(String),
}

impl Validation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Validation::Accepted)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Validation::Accepted => None,
            Validation::Rejected(msg) => Some(msg),
        }
    }

    /// `(accepted, error)` pair for callers that surface the message directly
    pub fn into_parts(self) -> (bool, Option<String>) {
        match self {
            Validation::Accepted => (true, None),
            Validation::Rejected(msg) => (false, Some(msg)),
        }
    }
}

/// Result of trying one template against one URL
#[derive(Debug)]
struct MatchAttempt {
    matched: bool,
    errors: Vec<String>,
}

/// Validate `url` for `service_name`.
///
/// The dummy URL is always accepted, and so is any URL for a service the catalog
/// does not know: unknown services cannot be validated, which is not the same as invalid.
pub fn validate(catalog: &ServiceCatalog, url: &str, service_name: &str) -> Validation {
    if url == DUMMY_URL {
        return Validation::Accepted;
    }

    match catalog.get_schema(service_name) {
        Some(schema) => validate_against(schema, url),
        None => {
            tracing::debug!(service = service_name, "Unknown service, URL accepted unvalidated");
            Validation::Accepted
        }
    }
}

/// Validate `url` against every template of `schema`
pub fn validate_against(schema: &ServiceSchema, url: &str) -> Validation {
    if url == DUMMY_URL {
        return Validation::Accepted;
    }

    let attempts: Vec<MatchAttempt> = schema
        .templates()
        .iter()
        .map(|template| try_template(schema, template, url))
        .collect();

    select_outcome(&attempts)
}

fn select_outcome(attempts: &[MatchAttempt]) -> Validation {
    let matched: Vec<&MatchAttempt> = attempts.iter().filter(|a| a.matched).collect();

    if matched.is_empty() {
        return Validation::Rejected(NO_TEMPLATE_MATCH.to_string());
    }

    if matched.iter().any(|a| a.errors.is_empty()) {
        return Validation::Accepted;
    }

    // min_by_key keeps the earliest template on ties
    let message = matched
        .iter()
        .min_by_key(|a| a.errors.len())
        .and_then(|a| a.errors.first().cloned())
        .unwrap_or_else(|| NO_TEMPLATE_MATCH.to_string());
    Validation::Rejected(message)
}

fn try_template(schema: &ServiceSchema, template: &CompiledTemplate, url: &str) -> MatchAttempt {
    let Some(captures) = template.match_url(url) else {
        return MatchAttempt {
            matched: false,
            errors: vec![format!("URL does not match template '{}'", template.source())],
        };
    };

    let mut errors = Vec::new();
    for (key, value) in captures {
        match schema.resolve(key) {
            Some(token) => check_token(schema, token, value, &mut errors),
            None => errors.push(format!("Token '{}' is not declared", key)),
        }
    }

    MatchAttempt {
        matched: true,
        errors,
    }
}

fn check_token(
    schema: &ServiceSchema,
    token: &TokenDescriptor,
    value: &str,
    errors: &mut Vec<String>,
) {
    match &token.kind {
        TokenKind::Int => check_number(token, value, &INT_VALUE, "an integer", errors),
        TokenKind::Float => check_number(token, value, &FLOAT_VALUE, "a number", errors),
        TokenKind::Str => {
            if let Some(pattern) = &token.pattern {
                if !pattern.is_match(value) {
                    errors.push(format!(
                        "{} does not match pattern '{}': '{}'",
                        token.label(),
                        pattern.source,
                        value
                    ));
                }
            }
        }
        TokenKind::Bool | TokenKind::Choice(_) => {
            if !token.values.iter().any(|v| v == value) {
                errors.push(format!(
                    "{} must be one of [{}], got '{}'",
                    token.label(),
                    token.values.join(", "),
                    value
                ));
            }
        }
        // Numeric lists are accepted as-is
        TokenKind::ListInt | TokenKind::ListFloat => {}
        TokenKind::ListStr => check_string_list(schema, token, value, errors),
        TokenKind::Unknown(raw) => {
            errors.push(format!("{} has unsupported type '{}'", token.label(), raw));
        }
    }
}

fn check_number(
    token: &TokenDescriptor,
    value: &str,
    shape: &Regex,
    expected: &str,
    errors: &mut Vec<String>,
) {
    let number = match value.parse::<f64>() {
        Ok(number) if shape.is_match(value) => number,
        _ => {
            errors.push(format!(
                "{} must be {}, got '{}'",
                token.label(),
                expected,
                value
            ));
            return;
        }
    };

    if let Some(min) = token.min {
        if number < min {
            errors.push(format!(
                "{} must be at least {}, got {}",
                token.label(),
                format_number(min),
                value
            ));
        }
    }
    if let Some(max) = token.max {
        if number > max {
            errors.push(format!(
                "{} must be at most {}, got {}",
                token.label(),
                format_number(max),
                value
            ));
        }
    }
}

fn check_string_list(
    schema: &ServiceSchema,
    token: &TokenDescriptor,
    value: &str,
    errors: &mut Vec<String>,
) {
    let group: Vec<&TokenDescriptor> = schema.group_members(token).collect();

    for element in split_list(value, &token.delim) {
        if !group.is_empty() {
            let satisfied = group
                .iter()
                .any(|member| member.pattern.as_ref().map_or(true, |p| p.is_match(element)));
            if !satisfied {
                let tried = group
                    .iter()
                    .filter_map(|member| member.pattern.as_ref())
                    .map(|p| format!("'{}'", p.source))
                    .collect::<Vec<_>>()
                    .join(", ");
                errors.push(format!(
                    "{} element '{}' does not match any of: {}",
                    token.label(),
                    element,
                    tried
                ));
            }
        } else if let Some(pattern) = &token.pattern {
            if !pattern.is_match(element) {
                errors.push(format!(
                    "{} element '{}' does not match pattern '{}'",
                    token.label(),
                    element,
                    pattern.source
                ));
            }
        }
    }
}

/// Split on the first delimiter present in `value`; no delimiter means one element
pub fn split_list<'v>(value: &'v str, delims: &[String]) -> Vec<&'v str> {
    match delims
        .iter()
        .find(|d| !d.is_empty() && value.contains(d.as_str()))
    {
        Some(delim) => value.split(delim.as_str()).collect(),
        None => vec![value],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::formats::YamlFormat;

    fn catalog() -> ServiceCatalog {
        ServiceCatalog::parse(
            r#"
schemas:
  - service_name: Sample
    protocols: [smp]
    secure_protocols: [smps]
    details:
      templates:
        - '{schema}://{host}:{port}'
        - '{schema}://{host}/{targets}'
        - '{schema}://{level}@{host}'
      tokens:
        host: { name: Host, required: true }
        port: { name: Port, type: int, min: 1, max: 5 }
        level: { name: Level, type: float, min: 0.5, max: 2 }
        phone: { name: Phone, regex: ['^[0-9]+$'] }
        channel: { name: Channel, regex: ['^#[a-z]+$'] }
        targets: { name: Targets, type: 'list:string', delim: [',', ' '], group: [phone, channel] }
"#,
            &YamlFormat,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_int_in_bounds() {
        assert!(validate(&catalog(), "smp://host:3", "Sample").is_accepted());
    }

    #[test]
    fn test_validate_int_above_max() {
        let result = validate(&catalog(), "smp://host:6", "Sample");
        let msg = result.error().unwrap();
        assert!(msg.contains("Port"));
        assert!(msg.contains("at most 5"));
    }

    #[test]
    fn test_validate_int_below_min() {
        let result = validate(&catalog(), "smp://host:0", "Sample");
        assert!(result.error().unwrap().contains("at least 1"));
    }

    #[test]
    fn test_validate_int_not_digits() {
        let result = validate(&catalog(), "smp://host:x1", "Sample");
        assert_eq!(
            result.error(),
            Some("Port (port) must be an integer, got 'x1'")
        );
    }

    #[test]
    fn test_validate_float() {
        assert!(validate(&catalog(), "smp://1.5@host", "Sample").is_accepted());
        let result = validate(&catalog(), "smp://2.5@host", "Sample");
        assert!(result.error().unwrap().contains("at most 2"));
        let result = validate(&catalog(), "smp://abc@host", "Sample");
        assert!(result.error().unwrap().contains("must be a number"));
    }

    #[test]
    fn test_validate_choice() {
        assert!(validate(&catalog(), "smps://host:2", "Sample").is_accepted());
        let result = validate(&catalog(), "ftp://host:2", "Sample");
        let msg = result.error().unwrap();
        assert!(msg.contains("must be one of [smp, smps]"));
        assert!(msg.contains("'ftp'"));
    }

    #[test]
    fn test_validate_group_list() {
        assert!(validate(&catalog(), "smp://host/123,#news", "Sample").is_accepted());
        assert!(validate(&catalog(), "smp://host/123 #news", "Sample").is_accepted());

        let result = validate(&catalog(), "smp://host/123,oops", "Sample");
        let msg = result.error().unwrap();
        assert!(msg.contains("element 'oops'"));
        assert!(msg.contains("'^[0-9]+$'"));
        assert!(msg.contains("'^#[a-z]+$'"));
    }

    #[test]
    fn test_no_template_match() {
        let result = validate(&catalog(), "garbage", "Sample");
        assert_eq!(result, Validation::Rejected(NO_TEMPLATE_MATCH.to_string()));
    }

    #[test]
    fn test_fewest_errors_wins() {
        // First template: schema and port both fail; third: only schema fails
        let result = validate(&catalog(), "ftp://1.0@host:9", "Sample");
        assert!(!result.is_accepted());
        assert!(result.error().unwrap().contains("Schema"));
    }

    #[test]
    fn test_dummy_url_always_accepted() {
        assert!(validate(&catalog(), DUMMY_URL, "Sample").is_accepted());
        assert!(validate(&catalog(), DUMMY_URL, "Anything").is_accepted());
    }

    #[test]
    fn test_unknown_service_is_permissive() {
        assert!(validate(&catalog(), "nonsense", "NotARealService").is_accepted());
    }

    fn loose_catalog() -> ServiceCatalog {
        ServiceCatalog::parse(
            r#"
schemas:
  - service_name: Loose
    details:
      templates:
        - 'loose://{mode}'
        - 'nums://{ints}/{floats}'
      tokens:
        mode: { name: Mode, type: matrix }
        ints: { name: Ints, type: 'list:int', min: 1, max: 5 }
        floats: { name: Floats, type: 'list:float' }
"#,
            &YamlFormat,
        )
        .unwrap()
    }

    #[test]
    fn test_unsupported_type_rejected() {
        let result = validate(&loose_catalog(), "loose://anything", "Loose");
        assert_eq!(
            result.error(),
            Some("Mode (mode) has unsupported type 'matrix'")
        );
    }

    #[test]
    fn test_numeric_lists_not_checked_per_element() {
        let catalog = loose_catalog();
        assert!(validate(&catalog, "nums://1,2/abc", "Loose").is_accepted());
        assert!(validate(&catalog, "nums://0,99,-7/1.5", "Loose").is_accepted());
        assert!(validate(&catalog, "nums://x/y", "Loose").is_accepted());
    }

    #[test]
    fn test_split_list() {
        let delims = vec![",".to_string(), " ".to_string()];
        assert_eq!(split_list("a,b c", &delims), vec!["a", "b c"]);
        assert_eq!(split_list("a b", &delims), vec!["a", "b"]);
        assert_eq!(split_list("ab", &delims), vec!["ab"]);
        assert_eq!(split_list("a,b", &[]), vec!["a,b"]);
    }

    #[test]
    fn test_into_parts() {
        assert_eq!(Validation::Accepted.into_parts(), (true, None));
        assert_eq!(
            Validation::Rejected("no".to_string()).into_parts(),
            (false, Some("no".to_string()))
        );
    }
}
