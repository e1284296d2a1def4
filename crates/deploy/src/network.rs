//! Network definitions and the profiles resolved from them.
//!
//! A [`NetworkDefinition`] is the declarative entry from the settings file: it
//! names *where* the connection parameters come from. Resolving it against the
//! process environment yields a [`NetworkProfile`], the concrete connection and
//! credential parameters a deployment runs with.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::ConfigError;

/// Name of the in-memory development network.
pub const LOCAL_NETWORK_NAME: &str = "hardhat";
/// Synthetic chain id of the in-memory development network.
pub const LOCAL_CHAIN_ID: u64 = 1337;
/// Name of the local development node network.
pub const NODE_NETWORK_NAME: &str = "localhost";
/// Default URL of a local development node.
pub const NODE_DEFAULT_URL: &str = "http://127.0.0.1:8545";

/// Environment variable holding the signing key for the remote networks.
pub const ACCOUNTS_PRIVATE_KEY_ENV: &str = "ACCOUNTS_PRIVATE_KEY";
/// Environment variable holding the testnet RPC URL.
pub const TESTNET_URL_ENV: &str = "POLYGON_MUMBAI_TESTNET_URL";
/// Environment variable holding the mainnet RPC URL.
pub const MAINNET_URL_ENV: &str = "POLYGON_MAINNET_URL";

/// The kind of network a profile targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum NetworkKind {
    /// A simulated chain living inside the process.
    InMemory,
    /// A local development node that signs with its own unlocked accounts.
    Node,
    /// A remote network reached over RPC with a locally held signing key.
    Remote,
}

/// A network entry as declared in the settings file.
///
/// ```toml
/// [networks.testnet]
/// kind = "remote"
/// url_env = "POLYGON_MUMBAI_TESTNET_URL"
/// key_env = "ACCOUNTS_PRIVATE_KEY"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum NetworkDefinition {
    InMemory {
        chain_id: u64,
    },
    Node {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chain_id: Option<u64>,
    },
    Remote {
        /// Environment variable holding the RPC URL.
        url_env: String,
        /// Environment variable holding the hex-encoded private key.
        key_env: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chain_id: Option<u64>,
    },
}

impl NetworkDefinition {
    pub fn kind(&self) -> NetworkKind {
        match self {
            NetworkDefinition::InMemory { .. } => NetworkKind::InMemory,
            NetworkDefinition::Node { .. } => NetworkKind::Node,
            NetworkDefinition::Remote { .. } => NetworkKind::Remote,
        }
    }

    /// Resolve this definition into a [`NetworkProfile`].
    ///
    /// `lookup` reads an environment variable. Empty (or whitespace-only)
    /// values count as missing.
    pub fn resolve<F>(&self, name: &str, lookup: F) -> Result<NetworkProfile, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ConfigError::MissingEnv {
                    network: name.to_string(),
                    var: var.to_string(),
                })
        };

        let parse_url = |raw: &str| {
            Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
                network: name.to_string(),
                source,
            })
        };

        let profile = match self {
            NetworkDefinition::InMemory { chain_id } => NetworkProfile {
                name: name.to_string(),
                kind: NetworkKind::InMemory,
                rpc_url: None,
                chain_id: Some(*chain_id),
                signing_key: None,
            },
            NetworkDefinition::Node { url, chain_id } => NetworkProfile {
                name: name.to_string(),
                kind: NetworkKind::Node,
                rpc_url: Some(parse_url(url)?),
                chain_id: *chain_id,
                signing_key: None,
            },
            NetworkDefinition::Remote {
                url_env,
                key_env,
                chain_id,
            } => {
                // Check both before parsing so a run with nothing set reports the URL first.
                let url = required(url_env)?;
                let key = required(key_env)?;

                NetworkProfile {
                    name: name.to_string(),
                    kind: NetworkKind::Remote,
                    rpc_url: Some(parse_url(&url)?),
                    chain_id: *chain_id,
                    signing_key: Some(SigningKey(key)),
                }
            }
        };

        Ok(profile)
    }
}

/// The built-in network table, used when the settings file does not override it.
pub fn default_networks() -> BTreeMap<String, NetworkDefinition> {
    BTreeMap::from([
        (
            LOCAL_NETWORK_NAME.to_string(),
            NetworkDefinition::InMemory {
                chain_id: LOCAL_CHAIN_ID,
            },
        ),
        (
            NODE_NETWORK_NAME.to_string(),
            NetworkDefinition::Node {
                url: NODE_DEFAULT_URL.to_string(),
                chain_id: None,
            },
        ),
        (
            "testnet".to_string(),
            NetworkDefinition::Remote {
                url_env: TESTNET_URL_ENV.to_string(),
                key_env: ACCOUNTS_PRIVATE_KEY_ENV.to_string(),
                chain_id: None,
            },
        ),
        (
            "mainnet".to_string(),
            NetworkDefinition::Remote {
                url_env: MAINNET_URL_ENV.to_string(),
                key_env: ACCOUNTS_PRIVATE_KEY_ENV.to_string(),
                chain_id: None,
            },
        ),
    ])
}

/// A secret signing key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(String);

impl SigningKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw hex-encoded key, with or without a `0x` prefix.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Connection and credential parameters for the network a deployment targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkProfile {
    pub name: String,
    pub kind: NetworkKind,
    /// RPC endpoint. `None` for the in-memory network.
    pub rpc_url: Option<Url>,
    /// Expected chain id, if declared.
    pub chain_id: Option<u64>,
    /// Signing key. Only set for remote networks.
    pub signing_key: Option<SigningKey>,
}
