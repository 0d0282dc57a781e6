//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;

/// teamscore - contribution scoring for group projects
///
/// Scores each member's activity, averages peer reviews and flags
/// free-riding or rating bias. Markdown/JSON reports, with an optional
/// narrative written by a local LLM.
///
/// Examples:
///   teamscore --snapshot ./orbit.json
///   teamscore --snapshot ./exports/orbit/ --format json -o orbit.json
///   teamscore --snapshot ./orbit.json --narrate --model llama3.2:latest
///   teamscore --snapshot ./orbit.json --fail-on-flags
///   teamscore --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Project snapshot to analyze
    ///
    /// Either a single JSON document or a directory holding project.json,
    /// members.json, events.json, tasks.json and reviews.json.
    #[arg(short, long, value_name = "PATH", required_unless_present = "init_config")]
    pub snapshot: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to the config file value, or contribution_report.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .teamscore.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Reference time for overdue tasks (RFC 3339), defaults to now
    #[arg(long, value_name = "TIMESTAMP")]
    pub as_of: Option<DateTime<Utc>>,

    /// Ask the LLM for a narrative section
    #[arg(long)]
    pub narrate: bool,

    /// Ollama model for the narrative
    #[arg(short, long, env = "TEAMSCORE_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Temperature for LLM responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Narrative request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Exit with code 2 when any fairness flag is raised
    ///
    /// Useful for grading pipelines that need a human look at flagged teams.
    #[arg(long)]
    pub fail_on_flags: bool,

    /// Generate a default .teamscore.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        match self.snapshot {
            Some(ref path) if !path.exists() => {
                return Err(format!("Snapshot path does not exist: {}", path.display()));
            }
            None => return Err("A snapshot path is required".to_string()),
            _ => {}
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
