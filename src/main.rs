use clap::Parser;
use quasar::cli::{Cli, run_cli};
use quasar::output::OutputFormatter;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let default_filter = if cli.verbose { "warn,quasar=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run_cli(cli) {
        OutputFormatter::error(&e.to_string());
        std::process::exit(1);
    }
}
