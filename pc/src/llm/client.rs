//! RemoteGenerator trait definition

use async_trait::async_trait;

use super::LlmError;
use crate::catalog::TemplateId;
use crate::draft::OutputFormat;

/// Everything a remote generator needs for one conversion
///
/// Same triple the local draft is computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub text: String,
    pub template: TemplateId,
    pub format: OutputFormat,
}

impl GenerationRequest {
    pub fn new(text: impl Into<String>, template: TemplateId, format: OutputFormat) -> Self {
        Self {
            text: text.into(),
            template,
            format,
        }
    }
}

/// Remote prompt generator
///
/// One call per conversion; implementations must not retry on their own.
#[async_trait]
pub trait RemoteGenerator: Send + Sync {
    /// Produce the final prompt for `request`
    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError>;
}
