//! FormPilot - Action Plan Engine for job-application form automation
//!
//! Offline CLI entry point: detect fields in a page snapshot, build a plan,
//! and run it against the deterministic harness behind the safety gates.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use formpilot_companion::CompanionClient;
use formpilot_config::{Config, ConfigLoader};
use formpilot_detector::{detect, find_controls};
use formpilot_executor::{ExecutionContext, PlanRunner};
use formpilot_governor::{
    JsonFileQuotaStore, JsonlAuditSink, SafetyGovernor, StaticConfirmation,
};
use formpilot_page::{HarnessPage, PageDocument, PageSession};
use formpilot_planner::{PlanOptions, ValueMap};
use formpilot_protocols::{
    AuditSink, CompanionService, ConfirmationSource, QuotaStore, StepStatus,
};

/// FormPilot CLI.
#[derive(Parser)]
#[command(name = "formpilot")]
#[command(about = "Action plan engine for automated job-application forms")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "formpilot.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect fillable fields in a page snapshot
    Detect {
        /// Page snapshot (JSON document tree)
        page: PathBuf,
    },

    /// Build an action plan from a page snapshot and a value map
    Plan {
        page: PathBuf,

        /// Values to insert, keyed by field key (JSON object)
        values: PathBuf,
    },

    /// Run a plan offline against the harness page, behind the safety gates
    Run {
        page: PathBuf,

        values: PathBuf,

        /// Approve the submit confirmation prompt up front
        #[arg(long)]
        confirm_submit: bool,

        /// Audit trail output (JSON lines)
        #[arg(long)]
        audit: Option<PathBuf>,
    },

    /// Probe the companion service health endpoint
    Check,
}

/// Get the .formpilot state directory path.
fn state_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".formpilot"))
        .unwrap_or_else(|| PathBuf::from(".formpilot"))
}

/// Initialize tracing with console and file output.
///
/// Log files are written to ~/.formpilot/debug/ with daily rotation.
fn init_tracing() -> anyhow::Result<()> {
    let log_dir = state_dir().join("debug");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("formpilot")
        .filename_suffix("log")
        .max_log_files(14)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

fn load_page(path: &PathBuf) -> anyhow::Result<PageDocument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading page snapshot {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("parsing page snapshot {}", path.display()))
}

fn load_values(path: &PathBuf) -> anyhow::Result<ValueMap> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading value map {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing value map {}", path.display()))
}

fn build_plan(
    page: &HarnessPage,
    values: &ValueMap,
    config: &Config,
) -> formpilot_protocols::ActionPlan {
    let snapshot = page.snapshot();
    let fields = detect(&snapshot);
    let controls = find_controls(&snapshot);
    info!("detected {} fields", fields.len());
    formpilot_planner::build(
        &fields,
        &controls,
        values,
        &PlanOptions {
            page_origin: page.origin(),
            plan_id: uuid::Uuid::new_v4(),
            generated_at: chrono::Utc::now(),
            allow_submit_step: config.planner.allow_submit_step,
            label_match_threshold: config.planner.label_match_threshold,
        },
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    let config = ConfigLoader::load_or_closed(&cli.config);

    match cli.command {
        Commands::Detect { page } => {
            let doc = load_page(&page)?;
            let fields = detect(&doc);
            println!("{}", serde_json::to_string_pretty(&fields)?);
        }

        Commands::Plan { page, values } => {
            let harness = HarnessPage::new(load_page(&page)?);
            let plan = build_plan(&harness, &load_values(&values)?, &config);
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }

        Commands::Run { page, values, confirm_submit, audit } => {
            run_plan(&config, &page, &values, confirm_submit, audit).await?;
        }

        Commands::Check => {
            let client = CompanionClient::new(
                &config.companion.base_url,
                config.companion.auth_token.clone(),
                Duration::from_millis(config.companion.request_timeout_ms),
            )?;
            match client.health().await {
                Ok(health) => println!("companion '{}' is {}", health.service, health.status),
                Err(e) => {
                    println!("companion unreachable: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

async fn run_plan(
    config: &Config,
    page: &PathBuf,
    values: &PathBuf,
    confirm_submit: bool,
    audit_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(state_dir())?;
    let harness = Arc::new(HarnessPage::new(load_page(page)?));
    let plan = build_plan(&harness, &load_values(values)?, config);
    info!("plan {} has {} steps across {} stage(s)", plan.plan_id, plan.steps.len(), plan.stage_count);

    let audit_file = audit_path.unwrap_or_else(|| state_dir().join("audit.jsonl"));
    let audit: Arc<dyn AuditSink> = Arc::new(JsonlAuditSink::create(&audit_file)?);
    let quota: Arc<dyn QuotaStore> = Arc::new(JsonFileQuotaStore::new(state_dir().join("quota.json")));
    let confirmation: Arc<dyn ConfirmationSource> = if confirm_submit {
        Arc::new(StaticConfirmation::approve())
    } else {
        Arc::new(StaticConfirmation::deny())
    };

    let governor = SafetyGovernor::new(
        config.safety.clone(),
        quota,
        confirmation.clone(),
        audit.clone(),
    );

    let mut ctx = ExecutionContext::new(
        harness.clone(),
        confirmation,
        audit,
        config.executor.clone(),
    )
    .with_harness(harness.clone() as Arc<dyn PageSession>);

    if !config.companion.auth_token.is_empty() {
        match CompanionClient::new(
            &config.companion.base_url,
            config.companion.auth_token.clone(),
            Duration::from_millis(config.companion.request_timeout_ms),
        ) {
            Ok(client) => ctx = ctx.with_companion(Arc::new(client)),
            Err(e) => warn!("companion not usable: {}", e),
        }
    }

    let report = PlanRunner::new(ctx).run(&plan, &governor).await?;

    if let Some(denial) = report.denial {
        println!("plan aborted: {}", denial);
        std::process::exit(2);
    }
    println!("plan finished: {}", report.phase);
    for (id, status) in &report.statuses {
        let step = plan.step(*id);
        let key = step.map(|s| s.target_key.as_str()).unwrap_or("?");
        let marker = match status {
            StepStatus::Success => "ok",
            StepStatus::Failed => "FAILED",
            StepStatus::Skipped => "skipped",
        };
        println!("  step {:>2} {:<20} {}", id, key, marker);
    }
    println!("{} attempt record(s) written to audit", report.results.len());
    Ok(())
}
