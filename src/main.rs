use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};

use auditrs::error::ErrorSeverity;
use auditrs::ingestion::normalize_reading;
use auditrs::logging::init_logging;
use auditrs::{
    AppConfig, AuditError, BiometricReading, CoachingPipeline, CoachingRequest, CoachingResponse,
    ComplianceClassifier, GeminiClient, LogFormat, ReadinessStatus, ReadinessVerdict,
};

/// AuditRS - Biometric readiness auditor
///
/// Classifies sleep, resting heart rate and recovery against fixed readiness
/// thresholds, then asks a language model for a coaching recommendation that
/// respects the verdict.
#[derive(Parser)]
#[command(name = "auditrs")]
#[command(author = "AuditRS Contributors")]
#[command(version)]
#[command(about = "Biometric readiness auditor", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format (pretty, json, compact)
    #[arg(long, value_name = "FORMAT", global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a reading without calling the coaching service
    Classify {
        #[command(flatten)]
        reading: ReadingArgs,

        /// Print the verdict as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify a reading and request a coaching recommendation
    Coach {
        /// Hours slept last night
        #[arg(long, allow_negative_numbers = true, required_unless_present = "input")]
        sleep: Option<f64>,

        /// Resting heart rate in bpm
        #[arg(long, allow_negative_numbers = true, required_unless_present = "input")]
        hr: Option<i32>,

        /// Recovery score (0-100)
        #[arg(long, allow_negative_numbers = true)]
        recovery: Option<f64>,

        /// Planned activity for today
        #[arg(short, long, required_unless_present = "input")]
        plan: Option<String>,

        /// Read the request from a JSON file instead
        #[arg(short, long, value_name = "FILE", conflicts_with_all = ["sleep", "hr", "recovery", "plan"])]
        input: Option<PathBuf>,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the configuration file
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file with --init
        #[arg(long, requires = "init")]
        force: bool,

        /// Print the effective configuration
        #[arg(long)]
        show: bool,

        /// Print the configuration file location
        #[arg(long)]
        path: bool,
    },
}

#[derive(Args)]
struct ReadingArgs {
    /// Hours slept last night
    #[arg(long, allow_negative_numbers = true)]
    sleep: f64,

    /// Resting heart rate in bpm
    #[arg(long, allow_negative_numbers = true)]
    hr: i32,

    /// Recovery score (0-100)
    #[arg(long, allow_negative_numbers = true)]
    recovery: Option<f64>,
}

impl ReadingArgs {
    fn to_reading(&self) -> BiometricReading {
        BiometricReading {
            sleep_hours: self.sleep,
            resting_heart_rate: self.hr,
            recovery_score: self.recovery,
        }
    }
}

#[derive(Tabled)]
struct AssessmentRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Tier")]
    tier: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let code = match err.downcast_ref::<AuditError>() {
            Some(audit_err) => {
                match audit_err.severity() {
                    ErrorSeverity::Critical | ErrorSeverity::Error => {
                        tracing::error!(error = %audit_err, "Request failed")
                    }
                    ErrorSeverity::Warning => tracing::warn!(error = %audit_err, "Request rejected"),
                }
                eprintln!("{} {}", "✗".red().bold(), audit_err.user_message());
                audit_err.exit_code()
            }
            None => {
                eprintln!("{} {:#}", "✗".red().bold(), err);
                1
            }
        };
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load_or_default(cli.config.as_deref())?;

    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    if let Some(format) = cli.log_format {
        log_config.format = format;
    }
    init_logging(&log_config)?;

    match cli.command {
        Commands::Classify { reading, json } => classify_command(&config, &reading, json),

        Commands::Coach {
            sleep,
            hr,
            recovery,
            plan,
            input,
            json,
        } => {
            let request = match input {
                Some(path) => read_request(&path)?,
                None => CoachingRequest {
                    reading: BiometricReading {
                        sleep_hours: sleep.context("--sleep is required")?,
                        resting_heart_rate: hr.context("--hr is required")?,
                        recovery_score: recovery,
                    },
                    planned_activity: plan.unwrap_or_default(),
                },
            };
            coach_command(&config, request, json).await
        }

        Commands::Config {
            init,
            force,
            show,
            path,
        } => config_command(cli.config.as_deref(), &config, init, force, show, path),
    }
}

fn classify_command(config: &AppConfig, args: &ReadingArgs, json: bool) -> Result<()> {
    let (reading, estimate) = normalize_reading(args.to_reading(), &config.ingestion);
    let verdict = ComplianceClassifier::new(config.thresholds).classify(&reading)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
        return Ok(());
    }

    print_verdict(&verdict);
    println!(
        "{}",
        format!("Estimated recovery score: {}/100", estimate).dimmed()
    );
    Ok(())
}

async fn coach_command(config: &AppConfig, request: CoachingRequest, json: bool) -> Result<()> {
    // Credential problems surface before any request is processed
    let api_key = config.generation.resolve_api_key()?;
    let client = GeminiClient::with_base_url(
        api_key,
        config.generation.api_base_url.as_str(),
        config.generation.timeout(),
    )?;
    let pipeline = CoachingPipeline::from_config(config, Arc::new(client));

    let response = pipeline.run(request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_response(&response);
    }
    Ok(())
}

fn config_command(
    explicit_path: Option<&Path>,
    config: &AppConfig,
    init: bool,
    force: bool,
    show: bool,
    path: bool,
) -> Result<()> {
    let config_path = explicit_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::default_config_path);

    if path {
        println!("{}", config_path.display());
    }

    if init {
        if config_path.exists() && !force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                config_path.display()
            );
        }
        AppConfig::default().save_to_file(&config_path)?;
        println!(
            "{} {}",
            "✓ Configuration written to".green(),
            config_path.display()
        );
    }

    if show || !(init || path) {
        let rendered =
            toml::to_string_pretty(config).context("Failed to render configuration")?;
        println!("{}", rendered);
    }

    Ok(())
}

fn read_request(path: &Path) -> Result<CoachingRequest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse request file {}", path.display()))
}

fn colored_status(status: ReadinessStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        ReadinessStatus::Optimal => label.green().bold(),
        ReadinessStatus::Warning => label.yellow().bold(),
        ReadinessStatus::Critical => label.red().bold(),
    }
}

fn print_verdict(verdict: &ReadinessVerdict) {
    println!("Readiness: {}", colored_status(verdict.status()));

    let rows: Vec<AssessmentRow> = verdict
        .assessments()
        .iter()
        .map(|a| AssessmentRow {
            metric: a.metric.to_string(),
            value: a.metric.format_value(a.value),
            tier: a.tier.to_string(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));

    for reason in verdict.reasons() {
        println!("  {} {}", "•".yellow(), reason);
    }
}

fn print_response(response: &CoachingResponse) {
    print_verdict(&response.compliance);
    println!(
        "{}",
        format!(
            "Estimated recovery score: {}/100",
            response.estimated_recovery_score
        )
        .dimmed()
    );
    println!();
    println!("{}", "Recommendation".cyan().bold());
    println!("{}", response.recommendation);
}
