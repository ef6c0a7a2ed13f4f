use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use docflow::script::{demo_script, load_script, run_script, ScriptStep, StepOutcome};
use docflow::{
    config, init_config, init_telemetry, shutdown_telemetry, EntityEvent, EventKind,
    NamedListener, WorkflowController,
};

#[derive(Parser)]
#[command(name = "docflow")]
#[command(about = "Replay document editing and approval workflows")]
#[command(long_about = "docflow drives an in-memory document through reversible edits and the \
                       draft/review/published lifecycle, printing every published event as JSON.")]
struct Cli {
    /// Identifier of the in-memory document
    #[arg(long, global = true, default_value = "document")]
    id: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in edit/undo/redo and approval walk-through
    Demo,
    /// Replay a JSON array of steps from a file
    Replay {
        /// Path to the script, e.g. [{"op":"insert","position":0,"text":"Hi"},{"op":"undo"}]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_config()?;
    let config = config()?;
    init_telemetry(&config.observability)?;

    let steps = match &cli.command {
        Commands::Demo => demo_script(),
        Commands::Replay { path } => load_script(path)?,
    };

    let result = replay(&cli.id, &steps);
    shutdown_telemetry();
    result
}

fn replay(id: &str, steps: &[ScriptStep]) -> Result<()> {
    let config = config()?;
    let mut controller = WorkflowController::new(id).with_config(config);

    controller.subscribe(
        Arc::new(NamedListener::new("stdout", |event: &EntityEvent| {
            println!("event {}", serde_json::to_string(event)?);
            Ok(())
        })),
        EventKind::ALL,
    );

    for report in run_script(&mut controller, steps) {
        match &report.outcome {
            StepOutcome::Applied { description, version, .. } => {
                println!("[{}] v{} {}", report.index, version, description);
            }
            StepOutcome::NoOp { description } => {
                println!("[{}] {}", report.index, description);
            }
            StepOutcome::Rejected { detail, .. } => {
                println!("[{}] rejected: {}", report.index, detail);
            }
        }
        println!("    content: '{}'", controller.content());
    }

    controller.metrics().log_stats();
    println!(
        "{}",
        serde_json::to_string_pretty(&controller.status_report())?
    );
    Ok(())
}
