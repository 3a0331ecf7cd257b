// Domain model for notification service schemas
// Schemas are built once at load time and only read afterwards

pub mod schema;
pub mod template;

pub use schema::{
    format_number, ServiceSchema, TokenDescriptor, TokenKind, TokenPattern, SCHEMA_TOKEN,
};
