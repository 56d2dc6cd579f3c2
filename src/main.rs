use anyhow::{Context, Result};
use dossier::cli::commands::{RunCommand, ValidateCommand};
use dossier::cli::output::{style, ConsolePublisher, CHECK, CROSS, INFO};
use dossier::cli::{Cli, Command};
use dossier::{
    ActivityRegistry, EngineError, PipelineRunner, PipelineSpec, StepDispatcher, StubServiceClient,
};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Run(cmd) => run_pipeline(cmd).await,
        Command::Validate(cmd) => validate_pipeline(cmd),
    }
}

async fn run_pipeline(cmd: &RunCommand) -> Result<()> {
    let spec = PipelineSpec::from_file(&cmd.file)
        .context("Failed to load pipeline specification")?;

    println!(
        "{} Loaded pipeline: {} ({} steps)",
        INFO,
        style(&spec.pipeline_id).bold(),
        spec.steps.len()
    );

    let activities = StubServiceClient::new(cmd.base_url.clone());
    let dispatcher = StepDispatcher::new(ActivityRegistry::builtin(), activities);
    let runner = PipelineRunner::new(dispatcher, Arc::new(ConsolePublisher));

    // Cancel at the next step boundary on Ctrl-C
    let cancel = runner.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    });

    println!();
    match runner.run(&spec).await {
        Ok(run) => {
            if cmd.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::Value::Object(run.results))?
                );
            }
            Ok(())
        }
        Err(EngineError::Cancelled) => {
            println!("\n{} Pipeline {} cancelled", CROSS, style(&spec.pipeline_id).bold());
            std::process::exit(130);
        }
        Err(err) => Err(err.into()),
    }
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    match PipelineSpec::from_file(&cmd.file) {
        Ok(spec) => {
            println!(
                "{} {} is valid ({} steps)",
                CHECK,
                style(&spec.pipeline_id).bold(),
                spec.steps.len()
            );
            Ok(())
        }
        Err(err) => {
            println!("{} {}", CROSS, style(&err).red());
            std::process::exit(1);
        }
    }
}
