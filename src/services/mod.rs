// Service exports
pub mod cache;
pub mod llm;
pub mod registry;

pub use cache::{CacheError, CacheKey, CacheManager, CacheStats};
pub use llm::{LlmClient, LlmError, SETUP_GUIDE};
pub use registry::{Registry, RegistryCounts, RegistryError, RegistrySnapshot};
