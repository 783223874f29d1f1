//! weekcheck command-line interface.
//!
//! Plays the role of the UI: reads the task list, drives the checklist
//! events and prints progress and status messages.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use weekcheck::config::{parse_endpoint, Config, StoreKind};
use weekcheck::store::KeyValueStore;
use weekcheck::{
    Checklist, DeliveryCoordinator, DeliveryOutcome, DeliveryStatus, TaskSpec, TrackerError,
};

/// Weekly checklist tracker
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON array of tasks: [{"id": "...", "label": "...", "initialChecked": false}]
    #[arg(short, long, env = "WEEKCHECK_TASKS", default_value = "tasks.json")]
    tasks: PathBuf,

    /// Collector endpoint (overrides WEEKCHECK_ENDPOINT)
    #[arg(long)]
    endpoint: Option<String>,

    /// State file (overrides WEEKCHECK_STATE_PATH)
    #[arg(long)]
    state: Option<PathBuf>,

    /// State backend: json, sqlite or memory (overrides WEEKCHECK_STORE)
    #[arg(long)]
    store: Option<String>,

    /// Directory for downloaded transcripts (overrides WEEKCHECK_DOWNLOAD_DIR)
    #[arg(long)]
    download_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show progress and every task
    Status,
    /// Check (or uncheck) a task
    Toggle {
        id: String,
        /// Uncheck instead of check
        #[arg(long)]
        off: bool,
        /// Deliver without asking when the list becomes complete
        #[arg(short, long)]
        yes: bool,
    },
    /// Deliver the transcript to the collector, falling back to a local file
    Deliver,
    /// Save the transcript locally without contacting the collector
    Download,
    /// Print the transcript as JSON
    Transcript,
}

impl Args {
    fn config(&self) -> Result<Config> {
        let mut config = Config::from_env()?;
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = parse_endpoint(endpoint)?;
        }
        if let Some(state) = &self.state {
            config.state_path = state.clone();
        }
        if let Some(store) = &self.store {
            config.store = store.parse::<StoreKind>()?;
        }
        if let Some(dir) = &self.download_dir {
            config.download_dir = dir.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("weekcheck=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = args.config()?;

    let specs = TaskSpec::load_list(&args.tasks)?;
    let store = config
        .open_store()
        .with_context(|| format!("Failed to open state at {}", config.state_path.display()))?;
    let coordinator = DeliveryCoordinator::http(config.endpoint.clone(), &config.download_dir);
    let mut checklist = Checklist::new(specs, store, coordinator)?;

    match args.command {
        Command::Status => print_status(&checklist),
        Command::Toggle { id, off, yes } => {
            let outcome = checklist.on_toggle(&id, !off)?;
            println!("Progress: {}%", outcome.percentage);

            if outcome.show_prompt {
                if yes || confirm("All tasks complete! Deliver weekly transcript now?")? {
                    deliver(&mut checklist).await?;
                } else {
                    checklist.on_cancel();
                }
            }
        }
        Command::Deliver => deliver(&mut checklist).await?,
        Command::Download => {
            let outcome = checklist.on_manual_download()?;
            print_outcome(&outcome);
        }
        Command::Transcript => {
            println!("{}", checklist.transcript().to_pretty_json()?);
        }
    }

    Ok(())
}

async fn deliver<S: KeyValueStore>(checklist: &mut Checklist<S>) -> Result<()> {
    if !checklist.is_complete() {
        return Err(TrackerError::NotComplete)
            .context("Run `weekcheck download` to save a partial transcript");
    }
    println!("{}", DeliveryStatus::Saving);
    let outcome = checklist.on_deliver_confirmed().await?;
    print_outcome(&outcome);
    Ok(())
}

fn print_status<S: KeyValueStore>(checklist: &Checklist<S>) {
    println!("Progress: {}%", checklist.progress());
    for task in checklist.tasks() {
        let mark = if task.checked { "x" } else { " " };
        match task.completed_at {
            Some(at) => println!("[{}] {} {} ({})", mark, task.id, task.label, at.to_rfc3339()),
            None => println!("[{}] {} {}", mark, task.id, task.label),
        }
    }
}

fn print_outcome(outcome: &DeliveryOutcome) {
    println!("{}", outcome.status);
    if let Some(url) = &outcome.download_url {
        println!("Download: {}", url);
    }
    if let Some(path) = &outcome.local_file {
        println!("Saved to {}", path.display());
    }
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
