//! Session context
//!
//! Holds what the user is currently working on (input, template, format,
//! premium flag) together with the orchestrator and the history store, and
//! exposes them through explicit accessors.

use std::sync::Arc;

use thiserror::Error;
use tracing::{Instrument, debug, info_span, warn};
use uuid::Uuid;

use crate::catalog::{self, TemplateId, TemplateKind};
use crate::config::SessionConfig;
use crate::draft::OutputFormat;
use crate::history::{HistoryId, HistoryItem, HistoryStore, KeyValueMedium, StoreError};
use crate::llm::RemoteGenerator;
use crate::orchestrator::{ConversionOrchestrator, ConversionState, ConvertError, Resolution, Snapshot, Ticket};

/// Errors from session operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("'{0}' is a premium template")]
    PremiumRequired(String),

    #[error("There is no output to save")]
    NothingToSave,
}

/// Fail with [`SessionError::PremiumRequired`] when `template` is a premium
/// catalog entry and premium is locked
pub fn check_access(template: &TemplateId, premium: bool) -> Result<(), SessionError> {
    if let Some(entry) = catalog::find(template)
        && entry.is_premium
        && !premium
    {
        debug!(%template, "check_access: premium required");
        return Err(SessionError::PremiumRequired(entry.name.to_string()));
    }
    Ok(())
}

/// One user's working state
pub struct Session<M: KeyValueMedium> {
    id: Uuid,
    input: String,
    template: TemplateId,
    format: OutputFormat,
    premium: bool,
    orchestrator: ConversionOrchestrator,
    history: HistoryStore<M>,
}

impl<M: KeyValueMedium> Session<M> {
    pub fn new(remote: Arc<dyn RemoteGenerator>, history: HistoryStore<M>) -> Self {
        Self::from_config(&SessionConfig::default(), remote, history)
    }

    /// Start a session from configured defaults
    ///
    /// A configured premium template without the premium flag falls back to General.
    pub fn from_config(config: &SessionConfig, remote: Arc<dyn RemoteGenerator>, history: HistoryStore<M>) -> Self {
        let id = Uuid::now_v7();
        debug!(%id, template = %config.template, "Session::from_config: called");
        let mut session = Self {
            id,
            input: String::new(),
            template: TemplateId::default(),
            format: config.format,
            premium: config.premium,
            orchestrator: ConversionOrchestrator::new(remote),
            history,
        };
        if let Err(e) = session.select_template(config.template.clone()) {
            warn!(%id, error = %e, "Configured template unavailable, using General");
        }
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn template(&self) -> &TemplateId {
        &self.template
    }

    /// Select a template
    ///
    /// Premium templates need the premium flag. Ids outside the catalog are
    /// accepted and pass input through unchanged.
    pub fn select_template(&mut self, template: TemplateId) -> Result<(), SessionError> {
        debug!(session = %self.id, %template, "select_template: called");
        check_access(&template, self.premium)?;
        self.template = template;
        Ok(())
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn set_format(&mut self, format: OutputFormat) {
        self.format = format;
    }

    pub fn is_premium(&self) -> bool {
        self.premium
    }

    /// Toggle premium access; losing it resets a premium selection to General
    pub fn set_premium(&mut self, premium: bool) {
        debug!(session = %self.id, premium, "set_premium: called");
        self.premium = premium;
        if !premium && catalog::find(&self.template).is_some_and(|t| t.is_premium) {
            debug!(template = %self.template, "set_premium: resetting premium selection");
            self.template = TemplateKind::General.into();
        }
    }

    /// Convert the current input with the current template and format
    pub async fn convert(&self) -> Result<Resolution, SessionError> {
        let ticket = self.begin()?;
        Ok(self.resolve(ticket).await)
    }

    /// First half of [`Session::convert`]: publish the local draft
    pub fn begin(&self) -> Result<Ticket, SessionError> {
        Ok(self.orchestrator.begin(&self.input, &self.template, self.format)?)
    }

    /// Second half of [`Session::convert`]: remote call and settlement
    pub async fn resolve(&self, ticket: Ticket) -> Resolution {
        let span = info_span!("resolve", session = %self.id, seq = ticket.seq());
        self.orchestrator.resolve(ticket).instrument(span).await
    }

    pub fn state(&self) -> ConversionState {
        self.orchestrator.state()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.orchestrator.snapshot()
    }

    pub fn orchestrator(&self) -> &ConversionOrchestrator {
        &self.orchestrator
    }

    /// Save the text currently shown into history
    pub fn save_output(&mut self) -> Result<HistoryItem, SessionError> {
        let text = self.orchestrator.snapshot().current_text;
        if text.is_empty() {
            return Err(SessionError::NothingToSave);
        }
        Ok(self.history.save(text)?)
    }

    pub fn delete_history(&mut self, id: HistoryId) -> Result<bool, SessionError> {
        Ok(self.history.delete(id)?)
    }

    pub fn history(&self) -> &[HistoryItem] {
        self.history.items()
    }
}
