/// Runtime knobs for the example generator and guide renderer
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Generate-and-check attempts before giving up on a service
    pub max_attempts: usize,
    /// Examples shown on a guide page
    pub guide_examples: usize,
    /// Upper bound on elements generated for list tokens
    pub max_list_elements: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            guide_examples: 3,
            max_list_elements: 3,
        }
    }
}

impl EngineSettings {
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}
