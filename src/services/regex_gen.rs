// Random strings matching a regular expression, generated from its parsed HIR

use rand::seq::IndexedRandom;
use rand::Rng;
use regex_syntax::hir::{Class, Hir, HirKind};
use regex_syntax::ParserBuilder;

/// Extra repetitions allowed past the minimum when a repetition has no upper bound
const UNBOUNDED_EXTRA: u32 = 8;

/// Characters that never change the structure of a URL
const UNRESERVED: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Generator for strings matching one pattern
pub struct RegexGenerator {
    hir: Hir,
}

impl RegexGenerator {
    pub fn new(pattern: &str, case_insensitive: bool) -> Result<Self, regex_syntax::Error> {
        let hir = ParserBuilder::new()
            .case_insensitive(case_insensitive)
            .build()
            .parse(pattern)?;
        Ok(Self { hir })
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        let mut out = String::new();
        emit(&self.hir, rng, &mut out);
        out
    }
}

fn emit<R: Rng + ?Sized>(hir: &Hir, rng: &mut R, out: &mut String) {
    match hir.kind() {
        // Anchors and word boundaries produce no text
        HirKind::Empty | HirKind::Look(_) => {}
        HirKind::Literal(literal) => out.push_str(&String::from_utf8_lossy(&literal.0)),
        HirKind::Class(Class::Unicode(class)) => {
            let ranges: Vec<(char, char)> = class
                .ranges()
                .iter()
                .map(|r| (r.start(), r.end()))
                .collect();
            if let Some(ch) = pick_char(&ranges, rng) {
                out.push(ch);
            }
        }
        HirKind::Class(Class::Bytes(class)) => {
            let ranges: Vec<(char, char)> = class
                .ranges()
                .iter()
                .map(|r| (r.start() as char, r.end() as char))
                .collect();
            if let Some(ch) = pick_char(&ranges, rng) {
                out.push(ch);
            }
        }
        HirKind::Repetition(rep) => {
            let max = rep
                .max
                .unwrap_or_else(|| rep.min.saturating_add(UNBOUNDED_EXTRA))
                .max(rep.min);
            let count = rng.random_range(rep.min..=max);
            for _ in 0..count {
                emit(&rep.sub, rng, out);
            }
        }
        HirKind::Capture(capture) => emit(&capture.sub, rng, out),
        HirKind::Concat(subs) => {
            for sub in subs {
                emit(sub, rng, out);
            }
        }
        HirKind::Alternation(subs) => {
            if let Some(sub) = subs.choose(rng) {
                emit(sub, rng, out);
            }
        }
    }
}

/// Pick a class member, preferring URL-unreserved ASCII, then printable ASCII
fn pick_char<R: Rng + ?Sized>(ranges: &[(char, char)], rng: &mut R) -> Option<char> {
    let contains = |c: char| ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi);

    let unreserved: Vec<char> = UNRESERVED
        .iter()
        .map(|&b| b as char)
        .filter(|&c| contains(c))
        .collect();
    if let Some(&ch) = unreserved.choose(rng) {
        return Some(ch);
    }

    let printable: Vec<char> = ('!'..='~')
        .filter(|&c| c != '{' && c != '}' && contains(c))
        .collect();
    if let Some(&ch) = printable.choose(rng) {
        return Some(ch);
    }

    let &(lo, hi) = ranges.choose(rng)?;
    Some(rng.random_range(lo..=hi))
}
