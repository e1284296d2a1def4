//! nftm deploys a compiled contract to the configured network and writes its
//! address to a generated source file.

mod cli;

use std::process::ExitCode;

use clap::Parser;

use cli::Cli;
use nftm_deploy::{DeployConfig, DeployError, DeploymentResult};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load the .env file before anything reads the environment.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize the logger. Logs go to stderr so stdout stays scriptable.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    match run(&cli).await {
        Ok(result) => {
            println!("{}", result.contract_address);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> Result<DeploymentResult, DeployError> {
    let config = DeployConfig::load(&cli.config, &cli.overrides())?;

    tracing::info!(
        config = %cli.config.display(),
        network = %config.network,
        contract = %config.contract,
        output = %config.output.display(),
        "Starting deployment..."
    );

    nftm_deploy::deploy(&config, |var| std::env::var(var).ok()).await
}
