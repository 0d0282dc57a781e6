//! teamscore - contribution scoring for group projects
//!
//! A CLI tool that reads a project snapshot (members, activity log,
//! task board, peer reviews), scores each member's contribution, averages
//! peer ratings, raises fairness flags and writes a report, optionally
//! with a narrative written by a local LLM through Ollama.
//!
//! Exit codes:
//!   0 - Success (no flags, or no --fail-on-flags set)
//!   1 - Runtime error (unreadable snapshot, config, output, etc.)
//!   2 - Fairness flags raised and --fail-on-flags set

mod analysis;
mod cli;
mod config;
mod feed;
mod models;
mod narrative;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::{Report, ReportMetadata};
use narrative::{NarrativeClient, NarrativeConfig};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("teamscore v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Scoring failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .teamscore.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize the narrative model and report layout.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the scoring workflow. Returns exit code (0 or 2).
async fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let snapshot_path = args
        .snapshot
        .clone()
        .context("A snapshot path is required")?;
    let as_of = args.as_of.unwrap_or_else(Utc::now);

    // Step 1: Read the snapshot
    if !args.quiet {
        println!("📥 Loading snapshot: {}", snapshot_path.display());
    }
    let snapshot = feed::load_snapshot(&snapshot_path)
        .await
        .with_context(|| format!("Failed to load snapshot {}", snapshot_path.display()))?;

    // Step 2: Score, aggregate and flag
    if !args.quiet {
        println!("🧮 Scoring {} members...", snapshot.members.len());
    }
    let analysis = analysis::analyze(&snapshot, as_of);
    let payload = analysis::assemble_payload(&snapshot, &analysis);

    // Step 3: Optional narrative
    let narrative = if config.report.narrate {
        if !args.quiet {
            println!("🤖 Requesting narrative from {}...", config.model.name);
        }
        generate_narrative(&config, &payload, args.quiet).await
    } else {
        None
    };

    // Step 4: Build and save the report
    let metadata = ReportMetadata {
        project_name: snapshot.project.name.clone(),
        course_code: snapshot.project.course_code.clone(),
        source: snapshot_path.display().to_string(),
        generated_at: Utc::now(),
        team_size: analysis.team_size,
        model_used: narrative.as_ref().map(|_| config.model.name.clone()),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let report = Report {
        metadata,
        payload,
        narrative,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };

    let output_path = std::path::PathBuf::from(&config.general.output);
    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    if !args.quiet {
        print_summary(&report);
        println!("\n✅ Report saved to: {}", output_path.display());
    }

    if args.fail_on_flags && !report.payload.flags.is_empty() {
        eprintln!(
            "\n⛔ {} fairness flag(s) raised. Failing (exit code 2).",
            report.payload.flags.len()
        );
        return Ok(2);
    }

    Ok(0)
}

/// Ask the narrative model for prose. Failures are logged and the report
/// goes out without a narrative.
async fn generate_narrative(
    config: &Config,
    payload: &models::ReportPayload,
    quiet: bool,
) -> Option<String> {
    let narrative_config = NarrativeConfig {
        ollama_url: config.model.ollama_url.clone(),
        model_name: config.model.name.clone(),
        temperature: config.model.temperature,
        max_tokens: config.model.max_tokens,
        timeout_seconds: config.model.timeout_seconds,
        retries: config.model.retries,
        show_progress: !quiet,
    };

    let result = match NarrativeClient::new(narrative_config) {
        Ok(client) => client.generate(payload).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(text) => Some(text),
        Err(e) => {
            warn!("Narrative generation failed, writing report without it: {:#}", e);
            None
        }
    }
}

/// Print the console summary.
fn print_summary(report: &Report) {
    let payload = &report.payload;

    println!("\n📊 Contribution Summary:");
    for score in &payload.contributions {
        println!(
            "   {:>3}%  {:>4} pts  {}",
            score.percentage, score.points, score.name
        );
    }
    println!(
        "   Tasks: {} total, {} done, {} overdue",
        payload.task_stats.total, payload.task_stats.done, payload.task_stats.overdue
    );

    if payload.flags.is_empty() {
        println!("   No fairness flags.");
    } else {
        println!("   Flags:");
        for flag in &payload.flags {
            println!(
                "   - {} {}: {}",
                flag.reason.emoji(),
                flag.subject_name,
                flag.reason
            );
        }
    }
    println!("   Duration: {:.2}s", report.metadata.duration_seconds);
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
