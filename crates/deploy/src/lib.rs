//! nftm-deploy - Contract deployment library.
//!
//! This crate resolves a network profile from layered settings and the process
//! environment, deploys a compiled contract to that network, waits for the
//! deployment to be confirmed and writes the contract address to a generated
//! source file for client code.

mod artifact;
pub use artifact::ContractArtifact;

mod backend;
pub use backend::{ChainBackend, DeployRequest, DeploymentReceipt, NetworkBackend};

mod config;
pub use config::{CONFIG_FILENAME, DeployConfig, ENV_PREFIX, SettingsOverrides};

mod error;
pub use error::{ConfigError, DeployError};

mod in_memory;
pub use in_memory::{DEV_ACCOUNT_ADDRESS, InMemoryChain};

pub mod network;
pub use network::{
    LOCAL_CHAIN_ID, LOCAL_NETWORK_NAME, NetworkDefinition, NetworkKind, NetworkProfile,
    SigningKey,
};

mod output;
pub use output::AddressFile;

mod rpc;
mod rpc_chain;
pub use rpc_chain::RpcChain;

mod runner;
pub use runner::{DeployStage, DeploymentResult, DeploymentRunner, deploy};
