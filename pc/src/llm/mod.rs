//! Remote generation
//!
//! The conversion pipeline only sees the [`RemoteGenerator`] trait; the
//! OpenAI-compatible client is one implementation of it.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod openai;
pub mod prompt;

pub use client::{GenerationRequest, RemoteGenerator};
pub use error::LlmError;
pub use openai::OpenAiGenerator;

use crate::config::LlmConfig;

/// Create a remote generator based on the provider specified in config
pub fn create_generator(config: &LlmConfig) -> Result<Arc<dyn RemoteGenerator>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_generator: called");
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiGenerator::from_config(config)?)),
        other => {
            debug!(provider = %other, "create_generator: unknown provider");
            Err(LlmError::InvalidResponse(format!(
                "Unknown LLM provider: '{}'. Supported: openai",
                other
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_rejected() {
        let config = LlmConfig {
            provider: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        let err = create_generator(&config).err().unwrap();
        assert!(err.to_string().contains("carrier-pigeon"));
    }
}
