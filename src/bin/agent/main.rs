mod brain;
mod eyes;

use std::io::{self, BufRead, Write};

use anyhow::{Result, anyhow};
use clap::Parser;
use dotenvy::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use screen_operator::hands::Desktop;
use screen_operator::prompts::{PromptMode, USER_QUESTION};
use screen_operator::{Config, Executor, Host, RecordingDevice, StepStatus, parse};

#[derive(Parser, Debug)]
#[command(name = "agent", about = "Operate the desktop with a vision model")]
struct Args {
    /// Model to use. Also picks the prompt style.
    #[arg(short, long)]
    model: Option<String>,

    /// Objective to accomplish. Read from stdin when absent.
    #[arg(long)]
    prompt: Option<String>,

    /// Log parser and executor internals.
    #[arg(long)]
    verbose: bool,

    /// Stop after this many model round-trips.
    #[arg(long)]
    max_steps: Option<usize>,

    /// Log input events instead of sending them.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = Config::from_env()?;
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(max_steps) = args.max_steps {
        config.max_steps = max_steps.max(1);
    }
    config.verbose = args.verbose;
    config.dry_run = args.dry_run;

    let objective = match args.prompt {
        Some(prompt) => prompt,
        None => ask_objective()?,
    };
    info!("objective: {objective}");
    info!("model: {}", config.model);
    if config.verbose {
        info!(
            "prompt mode: {:?}",
            PromptMode::for_model(&config.model)
        );
    }

    let mut host: Box<dyn Host> = if config.dry_run {
        let (width, height) = eyes::primary_size()?;
        info!("dry run on a {width}x{height} display");
        Box::new(RecordingDevice::new(width, height).echoing())
    } else {
        Box::new(Desktop::new()?)
    };

    run(&config, &objective, host.as_mut()).await
}

fn ask_objective() -> Result<String> {
    println!("{USER_QUESTION}");
    print!("> ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let objective = line.trim().to_string();
    if objective.is_empty() {
        return Err(anyhow!("no objective given"));
    }
    Ok(objective)
}

async fn run(config: &Config, objective: &str, host: &mut dyn Host) -> Result<()> {
    let mut brain = brain::Brain::new(config, objective);

    for step in 1..=config.max_steps {
        let screen = tokio::task::block_in_place(eyes::capture)?;
        info!(
            "step {step}/{}: captured {}x{} screen",
            config.max_steps, screen.width, screen.height
        );

        let reply = match brain.ask(&screen).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("model request failed: {e:#}");
                return Err(e);
            }
        };

        let batch = match parse(&reply) {
            Ok(batch) => batch,
            Err(e) => {
                warn!("could not use model reply: {e}");
                brain.observe(&format!(
                    "Your last response could not be used ({e}). \
                     Reply with only a JSON array of operations."
                ));
                continue;
            }
        };
        info!("model proposed {} action(s)", batch.len());

        // Input injection blocks; keep it off the async worker.
        let report =
            tokio::task::block_in_place(|| Executor::new(&mut *host).execute_batch(&batch));
        info!("executed {}/{} action(s)", report.executed, batch.len());

        match report.status {
            StepStatus::Done { summary } => {
                info!("objective complete: {summary}");
                println!("{summary}");
                return Ok(());
            }
            StepStatus::Failed { index, error } => {
                warn!("action {} failed: {error}", index + 1);
                brain.observe(&format!(
                    "Operation {} of your last response failed: {error}. \
                     Operations after it were not run.",
                    index + 1
                ));
            }
            StepStatus::NoTarget { .. } => {
                brain.observe("You reported nothing to click. Try a different approach.");
            }
            StepStatus::Exhausted => {}
        }
    }

    warn!("step limit reached ({})", config.max_steps);
    Err(anyhow!(
        "objective not completed within {} steps",
        config.max_steps
    ))
}
