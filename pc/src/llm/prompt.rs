//! System prompt for the remote generator
//!
//! The template is compiled into the binary and rendered with Handlebars.

use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::{GenerationRequest, LlmError};
use crate::catalog::TemplateKind;
use crate::draft::OutputFormat;

/// Embedded generation prompt
pub const GENERATE: &str = include_str!("../../prompts/generate.pmt");

const GENERATE_NAME: &str = "generate";

/// Context for rendering the generation prompt
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    /// Template id as the user selected it
    pub template: String,
    /// Extra direction for known templates
    pub guidance: Option<&'static str>,
    /// Ask for the `{type, subject, details}` object
    pub structured: bool,
}

impl PromptContext {
    pub fn for_request(request: &GenerationRequest) -> Self {
        debug!(template = %request.template, "PromptContext::for_request: called");
        Self {
            template: request.template.to_string(),
            guidance: request.template.kind().map(guidance),
            structured: request.format == OutputFormat::Json,
        }
    }
}

fn guidance(kind: TemplateKind) -> &'static str {
    match kind {
        TemplateKind::General => "state the assistant's role, the task and the relevant context",
        TemplateKind::Image => "subject, composition, style, lighting and quality qualifiers for an image model",
        TemplateKind::Blog => "audience, tone, structure (introduction, body, conclusion) and length of a blog post",
        TemplateKind::Coding => "language, requirements, constraints and expected output of a coding task",
        TemplateKind::Video => "scene, camera movement, lighting and resolution for a video model",
        TemplateKind::Ads => "benefits, target audience, call-to-action and urgency for ad copy",
    }
}

/// Renders the system prompt
pub struct PromptRenderer {
    hbs: Handlebars<'static>,
}

impl PromptRenderer {
    pub fn new() -> Result<Self, LlmError> {
        debug!("PromptRenderer::new: called");
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs.set_strict_mode(false);
        hbs.register_template_string(GENERATE_NAME, GENERATE)
            .map_err(|e| LlmError::Prompt(e.to_string()))?;
        Ok(Self { hbs })
    }

    pub fn render(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let context = PromptContext::for_request(request);
        debug!(?context, "PromptRenderer::render: called");
        self.hbs
            .render(GENERATE_NAME, &context)
            .map_err(|e| LlmError::Prompt(e.to_string()))
    }
}
