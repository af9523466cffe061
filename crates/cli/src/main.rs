mod config_commands;
mod notify;
mod telemetry;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    skillwatch_config::MonitorConfig,
    skillwatch_monitor::{Monitor, RunOutcome, catalog::CliCatalog},
    tracing::{error, info},
};

#[derive(Parser)]
#[command(name = "skillwatch", about = "Skillwatch: daily ClawHub new-skill monitor")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Config file (overrides discovery in ./ and ~/.config/skillwatch/).
    #[arg(long, global = true, env = "SKILLWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Working directory for state, report, snapshot, log and lock files.
    #[arg(long, global = true, env = "SKILLWATCH_WORK_DIR")]
    work_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitor once (default when no subcommand is provided).
    Run,
    /// Print the latest report for a delivery hook to forward.
    Notify {
        /// Report file (defaults to the configured report path).
        path: Option<PathBuf>,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn load_config(cli: &Cli) -> MonitorConfig {
    let mut config = tracing::subscriber::with_default(telemetry::bootstrap(&cli.log_level), || {
        skillwatch_config::discover_and_load(cli.config.as_deref())
    });
    if let Some(dir) = &cli.work_dir {
        config.paths.work_dir = dir.clone();
    }
    config
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = load_config(&cli);

    match cli.command {
        None | Some(Commands::Run) => {
            telemetry::init(&cli.log_level, Some(&config.paths.log_path()))?;
            let code = run_monitor(&config).await?;
            std::process::exit(code);
        },
        Some(Commands::Notify { path }) => {
            telemetry::init(&cli.log_level, None)?;
            let path = path.unwrap_or_else(|| config.paths.report_path());
            if !notify::print_report(&path)? {
                std::process::exit(1);
            }
            Ok(())
        },
        Some(Commands::Config { action }) => {
            telemetry::init(&cli.log_level, None)?;
            config_commands::handle_config(action, cli.config.as_deref(), &config)
        },
    }
}

async fn run_monitor(config: &MonitorConfig) -> anyhow::Result<i32> {
    info!(version = env!("CARGO_PKG_VERSION"), "skillwatch starting");
    let catalog = CliCatalog::new(&config.fetch.command, config.paths.work_dir.clone());

    let outcome = match Monitor::new(config, &catalog).run().await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Monitor run failed: {e}");
            return Err(e.into());
        },
    };
    if let RunOutcome::Completed(summary) = &outcome {
        info!(
            status = %summary.status,
            source = %summary.source,
            parsed = summary.parsed,
            new = summary.new,
            known = summary.known,
            "run finished"
        );
    }
    Ok(outcome.exit_code())
}
