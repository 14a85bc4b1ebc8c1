use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use submission_tracker::{
    EventStream, SubmissionTracker, TrackerConfig, TrackerEvent, TrackerOutcome, TrackerPhase,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a solution and watch it until judging finishes
    Submit {
        /// Tracker config file (TOML)
        #[arg(long, env = "JUDGE_WATCH_CONFIG", default_value = "tracker.toml")]
        config: PathBuf,
        /// Judge backend base url, overrides the config file
        #[arg(long, env = "JUDGE_WATCH_BASE_URL")]
        base_url: Option<String>,
        /// Bearer token sent with every request
        #[arg(long, env = "JUDGE_WATCH_ACCESS_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Problem slug
        #[arg(long)]
        problem: String,
        /// Submission language
        #[arg(long)]
        language: String,
        /// Source file to submit
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing()?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Submit {
            config,
            base_url,
            token,
            problem,
            language,
            file,
        } => {
            let config = load_config(config, base_url, token)?;
            let code = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read source file: {}", file.display()))?;
            submit(config, &problem, &code, &language).await
        }
    }
}

fn load_config(
    path: PathBuf,
    base_url: Option<String>,
    token: Option<String>,
) -> anyhow::Result<TrackerConfig> {
    let config = if path.exists() {
        info!(path = %path.display(), "loading tracker config");
        TrackerConfig::read_file(&path)?
    } else if let Some(base_url) = &base_url {
        TrackerConfig::with_base_url(base_url.clone())
    } else {
        bail!(
            "config file {} not found and no --base-url given",
            path.display()
        );
    };

    let config = config.with_overrides(base_url, token);
    config
        .validate()
        .with_context(|| format!("invalid tracker config: {}", path.display()))?;
    Ok(config)
}

async fn submit(
    config: TrackerConfig,
    problem: &str,
    code: &str,
    language: &str,
) -> anyhow::Result<ExitCode> {
    let tracker =
        SubmissionTracker::from_config(config).context("failed to initialize submission tracker")?;
    let mut events = tracker.subscribe_events();

    let handle = tracker
        .start(problem, code, language)
        .await
        .context("submission was not accepted by the judge")?;
    info!("watching submission, press Ctrl+C to stop");

    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, cancelling tracker");
                handle.cancel();
            }
            outcome = handle.wait() => break outcome,
            event = events.recv() => {
                match event {
                    Ok(event) => print_event(&event)?,
                    Err(err) => warn!(error = %err, "failed to receive tracker event"),
                }
            }
        }
    };

    flush_events(&mut events)?;
    Ok(exit_code(&outcome))
}

fn flush_events(events: &mut EventStream) -> anyhow::Result<()> {
    while let Ok(event) = events.try_recv() {
        print_event(&event)?;
    }
    Ok(())
}

fn print_event(event: &TrackerEvent) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

fn exit_code(outcome: &TrackerOutcome) -> ExitCode {
    match outcome.phase {
        TrackerPhase::Terminal if outcome.state.is_accepted() => ExitCode::SUCCESS,
        TrackerPhase::Terminal => ExitCode::from(1),
        TrackerPhase::Failed => ExitCode::from(2),
        TrackerPhase::Cancelled | TrackerPhase::Polling => ExitCode::from(130),
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
