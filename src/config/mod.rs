//! Pluggable policy sources.
//!
//! ```rust,no_run
//! use allocation_engine::config::{AllocationPolicy, PolicyBuilder};
//!
//! # async fn example() -> allocation_engine::Result<()> {
//! let source = PolicyBuilder::new()
//!     .env()
//!     .file("allocation.json")
//!     .build();
//! let policy = AllocationPolicy::load(&source).await?;
//! # Ok(())
//! # }
//! ```

pub mod composite;
pub mod env;
pub mod file;
pub mod memory;
pub mod policy;
pub mod provider;

pub use composite::CompositeSource;
pub use env::{DEFAULT_ENV_PREFIX, EnvSource};
pub use file::FileSource;
pub use memory::MemorySource;
pub use policy::{AllocationPolicy, RechargeConfig, RuleConfig, SubdivisionConfig, keys};
pub use provider::{PolicySource, PolicySourceExt};

use thiserror::Error;

/// Errors raised while reading policy sources
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Value present but not usable
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (file sources)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment error: {0}")]
    Env(#[from] std::env::VarError),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Fluent construction of a [`CompositeSource`]. Earlier sources win.
#[derive(Default)]
pub struct PolicyBuilder {
    sources: Vec<Box<dyn PolicySource>>,
}

impl PolicyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn env(mut self) -> Self {
        self.sources.push(Box::new(EnvSource::new()));
        self
    }

    pub fn env_with_prefix(mut self, prefix: &str) -> Self {
        self.sources.push(Box::new(EnvSource::prefixed(prefix)));
        self
    }

    pub fn file(mut self, path: impl AsRef<std::path::Path>) -> Self {
        self.sources
            .push(Box::new(FileSource::new(path.as_ref().to_path_buf())));
        self
    }

    pub fn memory(mut self, source: MemorySource) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn source(mut self, source: Box<dyn PolicySource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn build(self) -> CompositeSource {
        let mut composite = CompositeSource::new();
        for source in self.sources {
            composite.add_source(source);
        }
        composite
    }

    /// Builds the sources and loads an [`AllocationPolicy`] from them.
    pub async fn load(self) -> crate::Result<AllocationPolicy> {
        AllocationPolicy::load(&self.build()).await
    }
}
