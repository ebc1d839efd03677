//! Promptcraft - template-driven prompt converter
//!
//! Turns free-form text into a prompt for a downstream generative model.
//! A local draft is produced immediately from a fixed template catalog,
//! then a remote generator is asked for a better version; if that fails
//! the draft stays. Accepted prompts go into a persisted history.
//!
//! # Modules
//!
//! - [`catalog`] - the fixed template registry
//! - [`draft`] - local, network-free draft generation
//! - [`orchestrator`] - draft/remote sequencing and conversion state
//! - [`history`] - persisted prompt history
//! - [`session`] - per-user context tying the above together
//! - [`llm`] - remote generator trait and OpenAI-compatible client
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface
//!
//! # Example
//!
//! ```ignore
//! use promptcraft::{HistoryStore, MemoryMedium, Session, TemplateKind};
//!
//! let mut session = Session::new(generator, HistoryStore::load(MemoryMedium::new()));
//! session.set_input("a cat");
//! session.select_template(TemplateKind::Image.into())?;
//! session.convert().await?;
//! session.save_output()?;
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod draft;
pub mod history;
pub mod llm;
pub mod orchestrator;
pub mod session;

pub use catalog::{Template, TemplateId, TemplateKind};
pub use config::{Config, LlmConfig};
pub use draft::{OutputFormat, StructuredDraft};
pub use history::{FileMedium, HistoryId, HistoryItem, HistoryStore, KeyValueMedium, MemoryMedium, StoreError};
pub use llm::{GenerationRequest, LlmError, OpenAiGenerator, RemoteGenerator, create_generator};
pub use orchestrator::{ConversionOrchestrator, ConversionState, ConvertError, Resolution, Snapshot, Ticket};
pub use session::{Session, SessionError};
