//! Layered deployment settings.
//!
//! Settings are resolved once at startup, in increasing priority:
//!
//! 1. Built-in defaults (including the default network table)
//! 2. The `Deploy.toml` settings file, if present
//! 3. `NFTM_*` environment variables
//! 4. Explicit overrides (the CLI flags)

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::{
    ConfigError, LOCAL_NETWORK_NAME, NetworkDefinition, NetworkProfile, network::default_networks,
};

/// The default name of the settings file.
pub const CONFIG_FILENAME: &str = "Deploy.toml";

/// Prefix of the environment variables that override settings.
pub const ENV_PREFIX: &str = "NFTM_";

/// Settings keys that may be overridden from the environment.
const ENV_KEYS: &[&str] = &[
    "network",
    "contract",
    "artifacts",
    "output",
    "confirmations",
    "poll_interval_ms",
];

/// Fully resolved settings for a deployment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Name of the network to deploy to.
    pub network: String,
    /// Name of the contract artifact to deploy.
    pub contract: String,
    /// Directory holding the compiler's artifacts.
    pub artifacts: PathBuf,
    /// Path of the generated address file.
    pub output: PathBuf,
    /// Number of blocks (including the inclusion block) to wait for.
    pub confirmations: u64,
    /// Interval between receipt polls, in milliseconds. RPC networks poll no
    /// faster than every 50 ms.
    pub poll_interval_ms: u64,
    /// Declared networks, keyed by name.
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkDefinition>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            network: LOCAL_NETWORK_NAME.to_string(),
            contract: "NFTMarketplace".to_string(),
            artifacts: PathBuf::from("artifacts"),
            output: PathBuf::from("scripts/config.js"),
            confirmations: 1,
            poll_interval_ms: 1_000,
            networks: default_networks(),
        }
    }
}

/// Explicit overrides applied on top of the file and environment.
///
/// Unset fields leave the lower layers untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
}

impl DeployConfig {
    /// Build the layered figment for the given settings file.
    ///
    /// The network table only holds the networks the file declares. Built-in
    /// networks are added by [`DeployConfig::load`]. A declared entry replaces
    /// the built-in one of the same name.
    pub fn figment(path: &Path) -> Figment {
        let defaults = Self {
            networks: BTreeMap::new(),
            ..Self::default()
        };

        Figment::from(Serialized::defaults(defaults))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).only(ENV_KEYS))
    }

    /// Load the settings. A missing settings file is not an error.
    pub fn load(path: &Path, overrides: &SettingsOverrides) -> Result<Self, ConfigError> {
        let mut config: Self = Self::figment(path)
            .merge(Serialized::defaults(overrides))
            .extract()
            .map_err(Box::new)?;

        let mut networks = default_networks();
        networks.extend(std::mem::take(&mut config.networks));
        config.networks = networks;

        tracing::debug!(
            path = %path.display(),
            network = %config.network,
            contract = %config.contract,
            "Deployment settings loaded"
        );

        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Resolve the active network's profile, reading variables through `lookup`.
    pub fn network_profile<F>(&self, lookup: F) -> Result<NetworkProfile, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let definition =
            self.networks
                .get(&self.network)
                .ok_or_else(|| ConfigError::UnknownNetwork {
                    name: self.network.clone(),
                    known: self.networks.keys().cloned().collect::<Vec<_>>().join(", "),
                })?;

        definition.resolve(&self.network, lookup)
    }
}
