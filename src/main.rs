//! Sleuth CLI binary entry point.

use clap::Parser;
use sleuth::cli::{research, Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sleuth=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Research(args) => research::handle_research(args, config_path).await,
        Commands::Cache(args) => research::handle_cache(args.command, config_path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        eprintln!("hint: {}", e.recovery_suggestion().hint());
        std::process::exit(1);
    }
}
