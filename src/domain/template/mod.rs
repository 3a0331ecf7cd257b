// Template module for service URL templates
//
// This module provides parsing of `{token}` URL templates and their compilation
// into anchored matching patterns.

mod ast;
mod parser;
mod pattern;

pub use ast::{Template, TemplatePart};
pub use parser::TemplateParser;
pub use pattern::{to_pattern, CompiledTemplate};
