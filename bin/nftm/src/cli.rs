use std::path::PathBuf;

use clap::Parser;
use nftm_deploy::{CONFIG_FILENAME, SettingsOverrides};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "nftm")]
#[command(
    author,
    version,
    about = "Deploy a compiled contract and record its address for client code"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "NFTM_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// Path to the deployment settings file.
    ///
    /// A missing file is not an error: the built-in defaults are used.
    #[arg(long, alias = "conf", env = "NFTM_CONFIG", default_value = CONFIG_FILENAME)]
    pub config: PathBuf,

    /// The network to deploy to (e.g. hardhat, localhost, testnet, mainnet).
    ///
    /// Also read from NFTM_NETWORK. Defaults to the in-memory `hardhat` network.
    #[arg(short, long)]
    pub network: Option<String>,

    /// The contract to deploy, as a bare or fully qualified artifact name.
    #[arg(short, long)]
    pub contract: Option<String>,

    /// The compiler artifacts directory.
    #[arg(long)]
    pub artifacts: Option<PathBuf>,

    /// The path of the generated address file.
    #[arg(short, long, alias = "output")]
    pub out: Option<PathBuf>,

    /// The number of blocks, including the inclusion block, to wait for.
    #[arg(long)]
    pub confirmations: Option<u64>,
}

impl Cli {
    /// The settings given explicitly on the command line.
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            network: self.network.clone(),
            contract: self.contract.clone(),
            artifacts: self.artifacts.clone(),
            output: self.out.clone(),
            confirmations: self.confirmations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_leaves_settings_to_config() {
        let cli = Cli::try_parse_from(["nftm"]).unwrap();
        assert_eq!(cli.overrides(), SettingsOverrides::default());
    }

    #[test]
    fn test_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "nftm",
            "--network",
            "testnet",
            "--out",
            "web/src/config.js",
            "--confirmations",
            "2",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.network.as_deref(), Some("testnet"));
        assert_eq!(overrides.output, Some(PathBuf::from("web/src/config.js")));
        assert_eq!(overrides.confirmations, Some(2));
        assert!(overrides.contract.is_none());
    }
}
