//! Rink referee - development tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rink_core::config::RuleConfig;

#[derive(Parser)]
#[command(name = "rink-tools")]
#[command(about = "Development tools for the rink referee rule engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate rule config files
    Validate {
        /// Config file, or directory of `.ron` config files
        #[arg(default_value = "config")]
        path: PathBuf,
    },
    /// Replay a feed recording and print the officiating events
    Replay {
        /// Recording file (`.ron` or bincode)
        recording: PathBuf,
        /// Replay under this config instead of the recorded one
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
        /// Fail if the final state differs from the recorded one
        #[arg(long)]
        verify: bool,
    },
    /// Print the default rule config as RON
    DefaultConfig,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating rule configs in: {}", path.display());
            rink_tools::validate::validate_path(&path).map(|reports| {
                tracing::info!("Validation passed ({} files)", reports.len());
            })
        }
        Commands::Replay {
            recording,
            config,
            json,
            verify,
        } => rink_tools::replay::run_replay(&recording, config.as_deref(), verify).and_then(|report| {
            let mut out = std::io::stdout().lock();
            if json {
                rink_tools::replay::write_json(&report, &mut out)
            } else {
                rink_tools::replay::write_text(&report, &mut out)
            }
        }),
        Commands::DefaultConfig => RuleConfig::default()
            .to_ron_string()
            .map(|text| println!("{text}"))
            .map_err(Into::into),
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
