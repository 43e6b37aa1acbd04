//! Policy source trait

use serde::de::DeserializeOwned;

use super::{ConfigError, ConfigResult};

/// Read-only source of raw policy values.
///
/// Values are JSON documents (or plain strings) stored under dotted keys.
#[async_trait::async_trait]
pub trait PolicySource: Send + Sync {
    /// Source name for logging
    fn name(&self) -> &str;

    /// Raw value for `key`, if this source has one
    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>>;
}

/// Typed access on top of [`PolicySource`]
pub trait PolicySourceExt: PolicySource {
    /// Deserialize the JSON value stored under `key`
    fn get<T: DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = ConfigResult<Option<T>>> + Send
    where
        Self: Sync,
    {
        async move {
            match self.get_raw(key).await? {
                Some(raw) => {
                    let value: T =
                        serde_json::from_str(&raw).map_err(|e| ConfigError::InvalidValue {
                            key: key.to_string(),
                            message: e.to_string(),
                        })?;
                    tracing::debug!(source = self.name(), key, "Loaded policy value");
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }
}

impl<S: PolicySource + ?Sized> PolicySourceExt for S {}
