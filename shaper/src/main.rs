use anyhow::Context as _;
use clap::Parser;
use shaper::cli::Cli;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // the records go to stdout, keep the logs apart
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    debug!(command = ?cli.command, "starting");

    let stdout = std::io::stdout().lock();
    cli.run(stdout).context("shaper failed")
}
