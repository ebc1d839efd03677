//! CLI argument parsing for promptcraft

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::path::PathBuf;

use crate::catalog::TemplateId;
use crate::draft::OutputFormat;
use crate::history::HistoryId;

#[derive(Parser, Debug)]
#[command(name = "pc")]
#[command(author, version, about = "Turn rough ideas into structured AI prompts", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List available templates
    Templates,

    /// Print the local draft only, without contacting the remote generator
    Draft {
        /// Text to convert
        #[arg(required = true)]
        text: String,

        /// Template id or alias (general, image, blog, coding, video, ads)
        #[arg(short, long, value_parser = parse_template_id)]
        template: Option<TemplateId>,

        /// Output format (text or json)
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Unlock premium templates
        #[arg(long)]
        premium: bool,
    },

    /// Convert text: show the local draft, then the remote result
    Convert {
        /// Text to convert
        #[arg(required = true)]
        text: String,

        /// Template id or alias (general, image, blog, coding, video, ads)
        #[arg(short, long, value_parser = parse_template_id)]
        template: Option<TemplateId>,

        /// Output format (text or json)
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Unlock premium templates
        #[arg(long)]
        premium: bool,

        /// Save the final output to history
        #[arg(short, long)]
        save: bool,
    },

    /// Manage saved prompts
    History {
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// List saved prompts, newest first
    List,

    /// Print one saved prompt
    Show {
        #[arg(required = true)]
        id: HistoryId,
    },

    /// Save a prompt directly
    Add {
        #[arg(required = true)]
        prompt: String,
    },

    /// Delete a saved prompt
    Delete {
        #[arg(required = true)]
        id: HistoryId,
    },

    /// Delete every saved prompt
    Clear,
}

/// Resolve template aliases the same way config and library callers do
fn parse_template_id(s: &str) -> Result<TemplateId, Infallible> {
    s.parse()
}
