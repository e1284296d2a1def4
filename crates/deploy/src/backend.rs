//! The seam between the deployment runner and the network it deploys to.

use std::future::Future;

use alloy_core::primitives::{Address, B256, Bytes};
use anyhow::Result;

use crate::{
    ContractArtifact, DeployConfig, DeployError, InMemoryChain, NetworkKind, NetworkProfile,
    RpcChain,
};

/// A request to deploy one contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    pub contract_name: String,
    /// Creation bytecode (init code).
    pub bytecode: Bytes,
}

impl From<ContractArtifact> for DeployRequest {
    fn from(artifact: ContractArtifact) -> Self {
        Self {
            contract_name: artifact.contract_name,
            bytecode: artifact.bytecode,
        }
    }
}

/// The confirmed outcome of a deployment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentReceipt {
    pub tx_hash: B256,
    pub contract_address: Address,
    pub block_number: u64,
}

/// A network a contract can be deployed to.
///
/// Deployment is split in two phases so that the runner can tell a transaction
/// that never made it to the network from one that was sent but not confirmed.
pub trait ChainBackend: Send + Sync {
    /// Submit the deployment transaction, returning its hash.
    fn submit(&self, request: &DeployRequest) -> impl Future<Output = Result<B256>> + Send;

    /// Suspend until the transaction is confirmed.
    fn wait_for_confirmation(
        &self,
        tx_hash: B256,
    ) -> impl Future<Output = Result<DeploymentReceipt>> + Send;
}

/// The backend selected by the active network profile.
#[derive(Debug)]
pub enum NetworkBackend {
    InMemory(InMemoryChain),
    Rpc(RpcChain),
}

impl NetworkBackend {
    /// Build the backend for `profile`.
    ///
    /// No network call is made here; credential problems surface as
    /// [`DeployError::Config`] before anything is sent.
    pub fn connect(profile: &NetworkProfile, config: &DeployConfig) -> Result<Self, DeployError> {
        let backend = match profile.kind {
            NetworkKind::InMemory => NetworkBackend::InMemory(InMemoryChain::new(
                profile.chain_id.unwrap_or(crate::LOCAL_CHAIN_ID),
            )),
            NetworkKind::Node | NetworkKind::Remote => NetworkBackend::Rpc(RpcChain::from_profile(
                profile,
                config.confirmations,
                config.poll_interval(),
            )?),
        };

        tracing::debug!(network = %profile.name, kind = %profile.kind, "Network backend ready");

        Ok(backend)
    }
}

impl ChainBackend for NetworkBackend {
    async fn submit(&self, request: &DeployRequest) -> Result<B256> {
        match self {
            NetworkBackend::InMemory(chain) => chain.submit(request).await,
            NetworkBackend::Rpc(chain) => chain.submit(request).await,
        }
    }

    async fn wait_for_confirmation(&self, tx_hash: B256) -> Result<DeploymentReceipt> {
        match self {
            NetworkBackend::InMemory(chain) => chain.wait_for_confirmation(tx_hash).await,
            NetworkBackend::Rpc(chain) => chain.wait_for_confirmation(tx_hash).await,
        }
    }
}
