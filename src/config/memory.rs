//! In-memory policy source, for code-defined policies and tests.

use std::collections::HashMap;

use super::ConfigResult;
use super::provider::PolicySource;

#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    data: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::named("memory")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: HashMap::new(),
        }
    }

    pub fn from_data(data: HashMap<String, String>) -> Self {
        Self {
            name: "memory".to_string(),
            data,
        }
    }

    pub fn value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Stores `value` serialized as JSON.
    pub fn json(self, key: impl Into<String>, value: &serde_json::Value) -> Self {
        self.value(key, value.to_string())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PolicySource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        Ok(self.data.get(key).cloned())
    }
}
