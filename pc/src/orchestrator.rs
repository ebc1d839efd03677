//! Conversion orchestration
//!
//! Sequences one conversion: compute the local draft and publish it as
//! `Loading`, call the remote generator once, then settle on the remote
//! output or fall back to the draft. Every call is tagged with a sequence
//! number and only the most recent call may settle the state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::catalog::TemplateId;
use crate::draft::{self, OutputFormat};
use crate::llm::{GenerationRequest, LlmError, RemoteGenerator};

/// Shown alongside the retained draft when the remote call fails
pub const REMOTE_FAILURE_MESSAGE: &str =
    "Failed to get a response from the AI. Please check your API key and try again. Displaying local draft.";

/// Rejected before any work is done
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("Please enter some text to convert.")]
    EmptyInput,
}

/// Where the current conversion stands
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConversionState {
    #[default]
    Idle,
    /// Local draft shown while the remote call is outstanding
    Loading { draft: String },
    Succeeded { output: String },
    /// Remote call failed; the draft stays visible with an explanation
    FailedWithFallback { draft: String, error: String },
}

impl ConversionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// Text the presentation layer should display
    pub fn current_text(&self) -> &str {
        match self {
            Self::Idle => "",
            Self::Loading { draft } => draft,
            Self::Succeeded { output } => output,
            Self::FailedWithFallback { draft, .. } => draft,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::FailedWithFallback { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            is_loading: self.is_loading(),
            current_text: self.current_text().to_string(),
            error_message: self.error_message().map(str::to_string),
        }
    }
}

/// Flat view of [`ConversionState`] for rendering
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub is_loading: bool,
    pub current_text: String,
    pub error_message: Option<String>,
}

/// An issued conversion awaiting its remote result
///
/// Settled at most once; [`ConversionOrchestrator::finish`] consumes it.
#[derive(Debug)]
pub struct Ticket {
    seq: u64,
    draft: String,
    request: GenerationRequest,
}

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }
}

/// Outcome of settling a ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The ticket was the latest; this is the new state
    Applied(ConversionState),
    /// A newer conversion was issued meanwhile; the result was dropped
    Stale,
}

/// Drives conversions and owns the published [`ConversionState`]
pub struct ConversionOrchestrator {
    remote: Arc<dyn RemoteGenerator>,
    /// Held while publishing so that the staleness check and the state
    /// write are one step
    sequence: Mutex<Sequence>,
    state_tx: watch::Sender<ConversionState>,
}

impl ConversionOrchestrator {
    pub fn new(remote: Arc<dyn RemoteGenerator>) -> Self {
        debug!("ConversionOrchestrator::new: called");
        let (state_tx, _) = watch::channel(ConversionState::Idle);
        Self {
            remote,
            sequence: Mutex::new(Sequence::default()),
            state_tx,
        }
    }

    pub fn state(&self) -> ConversionState {
        self.state_tx.borrow().clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state_tx.borrow().snapshot()
    }

    /// Receive every published transition
    pub fn subscribe(&self) -> watch::Receiver<ConversionState> {
        self.state_tx.subscribe()
    }

    /// Run a full conversion
    ///
    /// The draft is published before the remote call is made. Remote
    /// failures never surface here; they become `FailedWithFallback`.
    pub async fn convert(
        &self,
        text: &str,
        template: &TemplateId,
        format: OutputFormat,
    ) -> Result<Resolution, ConvertError> {
        let ticket = self.begin(text, template, format)?;
        Ok(self.resolve(ticket).await)
    }

    /// Make the single remote call for `ticket` and settle it
    pub async fn resolve(&self, ticket: Ticket) -> Resolution {
        let result = self.remote.generate(ticket.request()).await;
        self.finish(ticket, result)
    }

    /// Validate input, publish the local draft and issue a ticket
    pub fn begin(&self, text: &str, template: &TemplateId, format: OutputFormat) -> Result<Ticket, ConvertError> {
        debug!(%template, %format, text_len = text.len(), "begin: called");
        if text.trim().is_empty() {
            debug!("begin: empty input rejected");
            return Err(ConvertError::EmptyInput);
        }

        let draft = draft::generate(text, template, format);

        let mut sequence = self.lock_sequence();
        let seq = sequence.issue();
        self.state_tx.send_replace(ConversionState::Loading { draft: draft.clone() });
        drop(sequence);

        info!(seq, %template, "Conversion started");
        Ok(Ticket {
            seq,
            draft,
            request: GenerationRequest::new(text, template.clone(), format),
        })
    }

    /// Settle a ticket with the remote result, unless it has been superseded
    pub fn finish(&self, ticket: Ticket, result: Result<String, LlmError>) -> Resolution {
        debug!(seq = ticket.seq, ok = result.is_ok(), "finish: called");
        let mut sequence = self.lock_sequence();
        if sequence.latest != ticket.seq || sequence.settled {
            debug!(
                seq = ticket.seq,
                latest = sequence.latest,
                settled = sequence.settled,
                "finish: stale result discarded"
            );
            return Resolution::Stale;
        }
        sequence.settled = true;

        let next = match result {
            Ok(output) => {
                info!(seq = ticket.seq, output_len = output.len(), "Conversion succeeded");
                ConversionState::Succeeded { output }
            }
            Err(e) => {
                warn!(seq = ticket.seq, error = %e, retryable = e.is_retryable(), "Remote generation failed, keeping local draft");
                ConversionState::FailedWithFallback {
                    draft: ticket.draft,
                    error: REMOTE_FAILURE_MESSAGE.to_string(),
                }
            }
        };
        self.state_tx.send_replace(next.clone());
        Resolution::Applied(next)
    }

    /// Return to `Idle`; any outstanding ticket becomes stale
    pub fn reset(&self) {
        debug!("reset: called");
        let mut sequence = self.lock_sequence();
        sequence.issue();
        self.state_tx.send_replace(ConversionState::Idle);
    }

    fn lock_sequence(&self) -> MutexGuard<'_, Sequence> {
        self.sequence.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Latest issued sequence number and whether it has been settled
#[derive(Debug, Default)]
struct Sequence {
    latest: u64,
    settled: bool,
}

impl Sequence {
    fn issue(&mut self) -> u64 {
        self.latest = self.latest.wrapping_add(1);
        self.settled = false;
        self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TemplateKind;
    use crate::llm::client::mock::MockGenerator;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Notify;

    const CAT_IMAGE: &str = "a cat, highly detailed, cinematic lighting, 4K, trending on ArtStation";

    fn image() -> TemplateId {
        TemplateKind::Image.into()
    }

    /// Blocks inside `generate` until released
    struct GatedGenerator {
        called: Notify,
        release: Notify,
        output: String,
    }

    impl GatedGenerator {
        fn new(output: &str) -> Self {
            Self {
                called: Notify::new(),
                release: Notify::new(),
                output: output.to_string(),
            }
        }
    }

    #[async_trait]
    impl RemoteGenerator for GatedGenerator {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, LlmError> {
            self.called.notify_one();
            self.release.notified().await;
            Ok(self.output.clone())
        }
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let orch = ConversionOrchestrator::new(Arc::new(MockGenerator::new(vec![])));
        assert_eq!(orch.state(), ConversionState::Idle);
        assert_eq!(orch.snapshot(), Snapshot::default());
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_without_work() {
        let mock = Arc::new(MockGenerator::succeeding("never"));
        let orch = ConversionOrchestrator::new(mock.clone());

        assert_eq!(orch.convert("", &image(), OutputFormat::Text).await, Err(ConvertError::EmptyInput));
        assert_eq!(
            orch.convert("   \n\t", &image(), OutputFormat::Text).await,
            Err(ConvertError::EmptyInput)
        );
        assert_eq!(orch.state(), ConversionState::Idle);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_success_replaces_draft() {
        let mock = Arc::new(MockGenerator::succeeding("A majestic cat"));
        let orch = ConversionOrchestrator::new(mock.clone());

        let resolution = orch.convert("a cat", &image(), OutputFormat::Text).await.unwrap();

        let expected = ConversionState::Succeeded {
            output: "A majestic cat".to_string(),
        };
        assert_eq!(resolution, Resolution::Applied(expected.clone()));
        assert_eq!(orch.state(), expected);
        assert_eq!(
            mock.requests(),
            vec![GenerationRequest::new("a cat", image(), OutputFormat::Text)]
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_loading_draft() {
        let orch = ConversionOrchestrator::new(Arc::new(MockGenerator::failing("quota exceeded")));

        orch.convert("a cat", &image(), OutputFormat::Text).await.unwrap();

        let snapshot = orch.snapshot();
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.current_text, CAT_IMAGE);
        assert_eq!(snapshot.error_message.as_deref(), Some(REMOTE_FAILURE_MESSAGE));
        // The cause is logged, not shown
        assert!(!REMOTE_FAILURE_MESSAGE.contains("quota"));
    }

    #[tokio::test]
    async fn test_draft_visible_before_remote_resolves() {
        let gated = Arc::new(GatedGenerator::new("final"));
        let orch = Arc::new(ConversionOrchestrator::new(gated.clone()));

        let task = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.convert("a cat", &image(), OutputFormat::Text).await })
        };

        gated.called.notified().await;
        let snapshot = orch.snapshot();
        assert!(snapshot.is_loading);
        assert_eq!(snapshot.current_text, CAT_IMAGE);
        assert!(snapshot.error_message.is_none());

        gated.release.notify_one();
        let resolution = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!(matches!(resolution, Resolution::Applied(ConversionState::Succeeded { .. })));
        assert_eq!(orch.snapshot().current_text, "final");
    }

    #[tokio::test]
    async fn test_subscribers_see_loading_then_result() {
        let orch = ConversionOrchestrator::new(Arc::new(MockGenerator::succeeding("done")));
        let mut rx = orch.subscribe();

        let ticket = orch.begin("a cat", &image(), OutputFormat::Text).unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_loading());

        orch.finish(ticket, Ok("done".to_string()));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().current_text(), "done");
    }

    #[tokio::test]
    async fn test_stale_success_is_discarded() {
        let orch = ConversionOrchestrator::new(Arc::new(MockGenerator::new(vec![])));

        let first = orch.begin("first", &image(), OutputFormat::Text).unwrap();
        let second = orch.begin("second", &image(), OutputFormat::Text).unwrap();
        assert!(second.seq() > first.seq());

        let applied = orch.finish(second, Ok("second result".to_string()));
        assert!(matches!(applied, Resolution::Applied(_)));

        assert_eq!(orch.finish(first, Ok("first result".to_string())), Resolution::Stale);
        assert_eq!(orch.snapshot().current_text, "second result");
    }

    #[tokio::test]
    async fn test_stale_failure_does_not_touch_newer_loading() {
        let orch = ConversionOrchestrator::new(Arc::new(MockGenerator::new(vec![])));

        let first = orch.begin("first", &image(), OutputFormat::Text).unwrap();
        let second = orch.begin("second", &image(), OutputFormat::Text).unwrap();

        let stale = orch.finish(first, Err(LlmError::InvalidResponse("late".to_string())));
        assert_eq!(stale, Resolution::Stale);
        assert_eq!(
            orch.state(),
            ConversionState::Loading {
                draft: second.draft().to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_out_of_order_completion_through_convert() {
        let slow = Arc::new(GatedGenerator::new("slow result"));
        let orch = Arc::new(ConversionOrchestrator::new(slow.clone()));

        let slow_task = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.convert("first", &image(), OutputFormat::Text).await })
        };
        slow.called.notified().await;

        // Newer conversion settles first
        let ticket = orch.begin("second", &image(), OutputFormat::Text).unwrap();
        orch.finish(ticket, Ok("fast result".to_string()));

        slow.release.notify_one();
        let resolution = slow_task.await.unwrap().unwrap();
        assert_eq!(resolution, Resolution::Stale);
        assert_eq!(orch.snapshot().current_text, "fast result");
    }

    #[tokio::test]
    async fn test_new_convert_clears_previous_error() {
        let mock = Arc::new(MockGenerator::new(vec![Err("down".to_string()), Ok("back up".to_string())]));
        let orch = ConversionOrchestrator::new(mock);

        orch.convert("a cat", &image(), OutputFormat::Text).await.unwrap();
        assert!(orch.snapshot().error_message.is_some());

        orch.convert("a cat", &image(), OutputFormat::Text).await.unwrap();
        let snapshot = orch.snapshot();
        assert!(snapshot.error_message.is_none());
        assert_eq!(snapshot.current_text, "back up");
    }

    #[tokio::test]
    async fn test_empty_input_keeps_previous_result() {
        let orch = ConversionOrchestrator::new(Arc::new(MockGenerator::succeeding("kept")));
        orch.convert("a cat", &image(), OutputFormat::Text).await.unwrap();

        assert!(orch.convert(" ", &image(), OutputFormat::Text).await.is_err());
        assert_eq!(orch.snapshot().current_text, "kept");
    }

    #[tokio::test]
    async fn test_reset_invalidates_outstanding_ticket() {
        let orch = ConversionOrchestrator::new(Arc::new(MockGenerator::new(vec![])));
        let ticket = orch.begin("a cat", &image(), OutputFormat::Text).unwrap();

        orch.reset();
        assert_eq!(orch.finish(ticket, Ok("late".to_string())), Resolution::Stale);
        assert_eq!(orch.state(), ConversionState::Idle);
    }

    #[tokio::test]
    async fn test_ticket_settles_only_once() {
        let orch = ConversionOrchestrator::new(Arc::new(MockGenerator::new(vec![])));
        let ticket = orch.begin("a cat", &image(), OutputFormat::Text).unwrap();
        let duplicate = Ticket {
            seq: ticket.seq(),
            draft: ticket.draft().to_string(),
            request: ticket.request().clone(),
        };

        let applied = orch.finish(ticket, Ok("remote".to_string()));
        assert!(matches!(applied, Resolution::Applied(ConversionState::Succeeded { .. })));

        let again = orch.finish(duplicate, Err(LlmError::InvalidResponse("late".to_string())));
        assert_eq!(again, Resolution::Stale);
        assert_eq!(
            orch.state(),
            ConversionState::Succeeded {
                output: "remote".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_structured_draft_while_loading() {
        let orch = ConversionOrchestrator::new(Arc::new(MockGenerator::new(vec![])));
        let ticket = orch.begin("a cat", &image(), OutputFormat::Json).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(ticket.draft()).unwrap();
        assert_eq!(parsed["type"], "Image Prompt");
        assert_eq!(parsed["details"], CAT_IMAGE);
    }
}
