// Error handling for uvlbot

use thiserror::Error;

/// Errors crossing the library boundary.
///
/// URL validation never produces one of these; it reports through `Validation`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Could not synthesize a valid example for {service} after {attempts} attempts")]
    ExampleExhausted { service: String, attempts: usize },

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Template rendering error: {0}")]
    TemplateRender(String),

    #[error("Dispatch to {url} failed: {reason}")]
    Dispatch { url: String, reason: String },
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

// Helper to convert template errors
impl From<askama::Error> for EngineError {
    fn from(err: askama::Error) -> Self {
        EngineError::TemplateRender(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_message() {
        let err = EngineError::ExampleExhausted {
            service: "Dummy".to_string(),
            attempts: 3,
        };
        assert_eq!(
            err.to_string(),
            "Could not synthesize a valid example for Dummy after 3 attempts"
        );
    }

    #[test]
    fn test_unknown_service_message() {
        let err = EngineError::UnknownService("Nope".to_string());
        assert!(err.to_string().contains("Nope"));
    }
}
