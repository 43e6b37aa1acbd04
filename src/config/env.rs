//! Environment variable policy source
//!
//! `rules` is read from `ALLOCATION_RULES`, `subdivision` from
//! `ALLOCATION_SUBDIVISION`, and so on.

use super::provider::PolicySource;
use super::{ConfigError, ConfigResult};

pub const DEFAULT_ENV_PREFIX: &str = "ALLOCATION_";

#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
}

impl EnvSource {
    pub fn new() -> Self {
        Self::prefixed(DEFAULT_ENV_PREFIX)
    }

    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn env_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key.to_uppercase().replace('.', "_"))
    }
}

impl Default for EnvSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PolicySource for EnvSource {
    fn name(&self) -> &str {
        "env"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        match std::env::var(self.env_key(key)) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(ConfigError::Env(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_conversion() {
        let source = EnvSource::new();
        assert_eq!(source.env_key("rules"), "ALLOCATION_RULES");
        assert_eq!(source.env_key("window.subdivision"), "ALLOCATION_WINDOW_SUBDIVISION");

        let source = EnvSource::prefixed("QUOTA_");
        assert_eq!(source.env_key("credits"), "QUOTA_CREDITS");
    }

    #[tokio::test]
    async fn test_env_source_get() {
        let source = EnvSource::prefixed("TEST_ALLOCATION_ENV_");

        // SAFETY: Test-only environment setup
        unsafe { std::env::set_var("TEST_ALLOCATION_ENV_SUBDIVISION", "{\"strategy\":\"cumulative\"}") };
        let value = source.get_raw("subdivision").await.unwrap();
        assert_eq!(value.as_deref(), Some("{\"strategy\":\"cumulative\"}"));
        unsafe { std::env::remove_var("TEST_ALLOCATION_ENV_SUBDIVISION") };
    }

    #[tokio::test]
    async fn test_env_source_missing() {
        let source = EnvSource::prefixed("NONEXISTENT_ALLOCATION_PREFIX_");
        assert_eq!(source.get_raw("rules").await.unwrap(), None);
    }
}
