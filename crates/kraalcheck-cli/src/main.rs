use std::process::ExitCode;

use clap::Parser;
use kraalcheck_cli::cli::{CheckArgs, Cli, Command};
use kraalcheck_cli::config::{AppConfig, LogFormat};
use kraalcheck_cli::fixtures::load_schema_file;
use kraalcheck_cli::service::{CheckInput, PermissionService};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    // stdout carries the decision, so logs go to stderr.
    let registry = tracing_subscriber::registry().with(filter);

    match config.log.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr);
            registry.with(fmt_layer).init();
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(std::io::stderr);
            registry.with(fmt_layer).init();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // No decision could be made, which reads as indeterminate.
    run(cli).await.unwrap_or_else(|err| {
        eprintln!("error: {err}");
        ExitCode::from(2)
    })
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&config);

    match cli.command {
        Command::Check(args) => run_check(&config, args).await,
        Command::Validate { schema } => {
            let schema = load_schema_file(&schema, &config.to_schema_limits())?;
            let actions: usize = schema.entities.iter().map(|e| e.actions.len()).sum();
            println!("ok: {} entities, {actions} actions", schema.entities.len());
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_check(
    config: &AppConfig,
    args: CheckArgs,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let service = PermissionService::from_files(&args.schema, &args.facts, config).await?;

    let outcome = service
        .check(CheckInput {
            subject: args.subject,
            action: args.action,
            object: args.object,
            depth: args.depth,
        })
        .await;

    println!("{outcome}");
    Ok(ExitCode::from(outcome.exit_code()))
}
