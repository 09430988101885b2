use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use broadcast_cli::{cli::Cli, commands, output};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG directives win over the command-line level
    let env_filter = EnvFilter::builder()
        .with_default_directive(cli.level_filter().into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match commands::execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            output::error(format!("Unexpected error: {e:#}"));
            ExitCode::FAILURE
        }
    }
}
