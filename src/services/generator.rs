// Example generator - synthesises service URLs that pass validation

use rand::distr::Alphanumeric;
use rand::seq::IndexedRandom;
use rand::Rng;

use super::regex_gen::RegexGenerator;
use crate::{
    config::settings::EngineSettings,
    domain::{ServiceSchema, TokenDescriptor, TokenKind, TokenPattern},
    error::{EngineError, EngineResult},
    validation::validate_against,
};

const DEFAULT_MIN: f64 = 0.0;
const DEFAULT_MAX: f64 = 100.0;
const DEFAULT_DELIM: &str = ",";
const MIN_DECIMALS: usize = 2;
const MAX_DECIMALS: usize = 15;

/// Generate-and-check example synthesis for one service.
///
/// Token values are drawn independently and the resulting URL is run through the
/// validator; rejected candidates are thrown away until one passes or the attempt
/// budget in [`EngineSettings::max_attempts`] runs out.
pub struct ExampleGenerator<'a> {
    schema: &'a ServiceSchema,
    settings: &'a EngineSettings,
}

impl<'a> ExampleGenerator<'a> {
    pub fn new(schema: &'a ServiceSchema, settings: &'a EngineSettings) -> Self {
        Self { schema, settings }
    }

    /// Produce a URL accepted by the validator.
    ///
    /// `preferred` is used when it is one of the schema's templates; otherwise every
    /// attempt picks a template uniformly at random.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        preferred: Option<&str>,
        rng: &mut R,
    ) -> EngineResult<String> {
        let preferred = preferred.and_then(|source| self.schema.find_template(source));

        for attempt in 1..=self.settings.max_attempts {
            let Some(template) = preferred.or_else(|| self.schema.templates().choose(rng)) else {
                break;
            };

            let url = template
                .template()
                .substitute(|key| self.token_value(key, rng));

            if validate_against(self.schema, &url).is_accepted() {
                tracing::debug!(
                    service = %self.schema.service_name,
                    attempt,
                    "Generated example URL"
                );
                return Ok(url);
            }
            tracing::trace!(service = %self.schema.service_name, attempt, %url, "Example rejected");
        }

        tracing::warn!(
            service = %self.schema.service_name,
            attempts = self.settings.max_attempts,
            "Could not synthesize a valid example"
        );
        Err(EngineError::ExampleExhausted {
            service: self.schema.service_name.clone(),
            attempts: self.settings.max_attempts,
        })
    }

    fn token_value<R: Rng + ?Sized>(&self, key: &str, rng: &mut R) -> String {
        match self.schema.resolve(key) {
            Some(token) => self.value_for(token, rng),
            None => random_alphanumeric(rng),
        }
    }

    fn value_for<R: Rng + ?Sized>(&self, token: &TokenDescriptor, rng: &mut R) -> String {
        match &token.kind {
            TokenKind::Int => random_int(token, rng),
            TokenKind::Float => random_float(token, rng),
            TokenKind::Str => random_string(token.pattern.as_ref(), rng),
            TokenKind::Bool | TokenKind::Choice(_) => {
                token.values.choose(rng).cloned().unwrap_or_default()
            }
            TokenKind::ListInt | TokenKind::ListFloat | TokenKind::ListStr => {
                let delim = token
                    .delim
                    .choose(rng)
                    .map(String::as_str)
                    .unwrap_or(DEFAULT_DELIM);
                let count = rng.random_range(1..=self.settings.max_list_elements.max(1));
                (0..count)
                    .map(|_| self.list_element(token, rng))
                    .collect::<Vec<_>>()
                    .join(delim)
            }
            TokenKind::Unknown(_) => random_alphanumeric(rng),
        }
    }

    fn list_element<R: Rng + ?Sized>(&self, token: &TokenDescriptor, rng: &mut R) -> String {
        match token.kind {
            TokenKind::ListInt => random_int(token, rng),
            TokenKind::ListFloat => random_float(token, rng),
            _ => {
                // Group members' patterns take precedence over the list's own
                let group: Vec<&TokenDescriptor> = self.schema.group_members(token).collect();
                let pattern = match group.choose(rng) {
                    Some(member) => member.pattern.as_ref(),
                    None => token.pattern.as_ref(),
                };
                random_string(pattern, rng)
            }
        }
    }
}

/// Bounds used for generation, widening a lone bound that lies outside the default range
fn bounds(token: &TokenDescriptor) -> (f64, f64) {
    match (token.min, token.max) {
        (Some(lo), Some(hi)) => (lo, hi),
        (Some(lo), None) if lo > DEFAULT_MAX => (lo, lo + DEFAULT_MAX),
        (Some(lo), None) => (lo, DEFAULT_MAX),
        (None, Some(hi)) if hi < DEFAULT_MIN => (hi - DEFAULT_MAX, hi),
        (None, Some(hi)) => (DEFAULT_MIN, hi),
        (None, None) => (DEFAULT_MIN, DEFAULT_MAX),
    }
}

fn random_int<R: Rng + ?Sized>(token: &TokenDescriptor, rng: &mut R) -> String {
    let (lo, hi) = bounds(token);
    let (lo, hi) = (lo.ceil() as i64, hi.floor() as i64);
    if lo >= hi {
        return lo.to_string();
    }
    rng.random_range(lo..=hi).to_string()
}

fn random_float<R: Rng + ?Sized>(token: &TokenDescriptor, rng: &mut R) -> String {
    let (lo, hi) = bounds(token);
    if lo >= hi {
        return format_in_range(lo, lo, lo);
    }
    format_in_range(rng.random_range(lo..=hi), lo, hi)
}

/// Fewest decimals (at least 2) whose rounding of `value` stays within `[lo, hi]`
fn format_in_range(value: f64, lo: f64, hi: f64) -> String {
    (MIN_DECIMALS..=MAX_DECIMALS)
        .map(|decimals| format!("{:.*}", decimals, value))
        .find(|text| {
            text.parse::<f64>()
                .map_or(false, |rounded| lo <= rounded && rounded <= hi)
        })
        .unwrap_or_else(|| value.to_string())
}

fn random_string<R: Rng + ?Sized>(pattern: Option<&TokenPattern>, rng: &mut R) -> String {
    match pattern
        .filter(|p| p.is_usable())
        .and_then(|p| RegexGenerator::new(&p.source, p.case_insensitive).ok())
    {
        Some(generator) => generator.generate(rng),
        None => random_alphanumeric(rng),
    }
}

fn random_alphanumeric<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.random_range(5..=20);
    (0..len).map(|_| rng.sample(Alphanumeric) as char).collect()
}
