//! inkgrade CLI: score drawing attempts and track progress across sessions.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "inkgrade", version, about = "Drawing exercise assessment engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single attempt
    Assess {
        /// Path to .toml exercise set or directory
        #[arg(long)]
        exercises: PathBuf,

        /// Attempt JSON file
        #[arg(long)]
        attempt: PathBuf,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Score a directory of attempts and write a session report
    Run {
        /// Path to .toml exercise set or directory
        #[arg(long)]
        exercises: PathBuf,

        /// Directory of attempt JSON files
        #[arg(long)]
        attempts: PathBuf,

        /// Max concurrent analyses (default from config)
        #[arg(long)]
        parallelism: Option<usize>,

        /// Output directory (default from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate exercise set TOML files
    Validate {
        /// Path to exercise set file or directory
        #[arg(long)]
        exercises: PathBuf,
    },

    /// Compare two session reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Score points a best score may move before it counts (default from config)
        #[arg(long)]
        threshold: Option<f64>,

        /// Exit code 1 if any exercise declined
        #[arg(long)]
        fail_on_decline: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create starter config, exercise set and attempt
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("inkgrade=info".parse().unwrap())
                .add_directive("inkgrade_core=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Assess {
            exercises,
            attempt,
            format,
        } => commands::assess::execute(exercises, attempt, format),
        Commands::Run {
            exercises,
            attempts,
            parallelism,
            output,
            config,
        } => commands::run::execute(exercises, attempts, parallelism, output, config).await,
        Commands::Validate { exercises } => commands::validate::execute(exercises),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_decline,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_decline, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
