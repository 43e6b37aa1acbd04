//! Composite policy source
//!
//! Chains sources with priority ordering. Earlier sources win.

use super::ConfigResult;
use super::provider::PolicySource;

#[derive(Default)]
pub struct CompositeSource {
    sources: Vec<Box<dyn PolicySource>>,
}

impl CompositeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source (first added = highest priority)
    pub fn add_source(&mut self, source: Box<dyn PolicySource>) {
        self.sources.push(source);
    }

    pub fn source(mut self, source: Box<dyn PolicySource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

#[async_trait::async_trait]
impl PolicySource for CompositeSource {
    fn name(&self) -> &str {
        "composite"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        for source in &self.sources {
            if let Some(value) = source.get_raw(key).await? {
                tracing::debug!(source = source.name(), key, "Policy value resolved");
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for CompositeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeSource")
            .field("sources", &self.source_names())
            .finish()
    }
}
