//! Promptcraft CLI entry point

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use promptcraft::catalog::{self, TemplateId};
use promptcraft::cli::{Cli, Command, HistoryCommand};
use promptcraft::config::Config;
use promptcraft::draft::{self, OutputFormat};
use promptcraft::history::{FileMedium, HistoryStore};
use promptcraft::llm::{GenerationRequest, LlmError, RemoteGenerator, create_generator};
use promptcraft::orchestrator::{ConversionState, Resolution};
use promptcraft::session::{self, Session};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("promptcraft")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("promptcraft.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// Stand-in used when no real generator can be built, so conversions still
/// fall back to the local draft
struct UnavailableGenerator {
    reason: String,
}

#[async_trait::async_trait]
impl RemoteGenerator for UnavailableGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, LlmError> {
        Err(LlmError::InvalidResponse(self.reason.clone()))
    }
}

fn open_history(config: &Config) -> Result<HistoryStore<FileMedium>> {
    let medium = FileMedium::open(&config.storage.history_dir).context(format!(
        "Failed to open history directory {}",
        config.storage.history_dir.display()
    ))?;
    Ok(HistoryStore::load(medium))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!("promptcraft starting");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Templates => cmd_templates(),
        Command::Draft {
            text,
            template,
            format,
            premium,
        } => cmd_draft(&config, &text, template, format, premium),
        Command::Convert {
            text,
            template,
            format,
            premium,
            save,
        } => cmd_convert(&config, text, template, format, premium, save).await,
        Command::History { command } => cmd_history(&config, command),
    }
}

fn cmd_templates() -> Result<()> {
    for template in catalog::list() {
        if template.is_premium {
            println!("{} {}", template.name.cyan(), "(premium)".yellow());
        } else {
            println!("{}", template.name.cyan());
        }
    }
    Ok(())
}

fn cmd_draft(
    config: &Config,
    text: &str,
    template: Option<TemplateId>,
    format: Option<OutputFormat>,
    premium: bool,
) -> Result<()> {
    let premium = premium || config.session.premium;
    let template = match template {
        Some(template) => {
            session::check_access(&template, premium)?;
            template
        }
        // Same fallback a session applies to a locked configured template
        None => match session::check_access(&config.session.template, premium) {
            Ok(()) => config.session.template.clone(),
            Err(e) => {
                warn!(error = %e, "Configured template unavailable, using General");
                TemplateId::default()
            }
        },
    };
    let format = format.unwrap_or(config.session.format);
    println!("{}", draft::generate(text, &template, format));
    Ok(())
}

async fn cmd_convert(
    config: &Config,
    text: String,
    template: Option<TemplateId>,
    format: Option<OutputFormat>,
    premium: bool,
    save: bool,
) -> Result<()> {
    let generator: Arc<dyn RemoteGenerator> = match create_generator(&config.llm) {
        Ok(generator) => generator,
        Err(e) => {
            warn!(error = %e, "Remote generator unavailable");
            Arc::new(UnavailableGenerator { reason: e.to_string() })
        }
    };

    let mut session = Session::from_config(&config.session, generator, open_history(config)?);
    session.set_premium(premium || config.session.premium);
    if let Some(template) = template {
        session.select_template(template)?;
    }
    if let Some(format) = format {
        session.set_format(format);
    }
    session.set_input(text);

    // The draft is shown before the remote call is made
    let ticket = session.begin()?;
    println!("{}\n{}\n", "Draft:".dimmed(), ticket.draft());

    match session.resolve(ticket).await {
        Resolution::Applied(ConversionState::Succeeded { output }) => {
            println!("{}\n{}", "Result:".green(), output);
        }
        Resolution::Applied(ConversionState::FailedWithFallback { draft, error }) => {
            eprintln!("{} {}", "!".yellow(), error);
            println!("{}\n{}", "Result (local draft):".yellow(), draft);
        }
        Resolution::Applied(other) => debug!(?other, "cmd_convert: unexpected final state"),
        Resolution::Stale => debug!("cmd_convert: superseded"),
    }

    if save {
        let item = session.save_output()?;
        println!("{} Saved to history as #{}", "✓".green(), item.id);
    }
    Ok(())
}

fn cmd_history(config: &Config, command: HistoryCommand) -> Result<()> {
    let mut store = open_history(config)?;
    match command {
        HistoryCommand::List => {
            if store.is_empty() {
                println!("No saved prompts");
            }
            for item in store.items() {
                let first_line = item.prompt.lines().next().unwrap_or("");
                println!("{} {} {}", format!("#{}", item.id).yellow(), item.timestamp.dimmed(), first_line);
            }
        }
        HistoryCommand::Show { id } => {
            let item = store
                .get(id)
                .ok_or_else(|| eyre::eyre!("No saved prompt with id {}", id))?;
            println!("{}", item.prompt);
        }
        HistoryCommand::Add { prompt } => {
            let item = store.save(prompt)?;
            println!("{} Saved to history as #{}", "✓".green(), item.id);
        }
        HistoryCommand::Delete { id } => {
            if store.delete(id)? {
                println!("{} Deleted #{}", "✓".green(), id);
            } else {
                println!("Nothing saved under #{}", id);
            }
        }
        HistoryCommand::Clear => {
            store.clear()?;
            println!("{} History cleared", "✓".green());
        }
    }
    Ok(())
}
