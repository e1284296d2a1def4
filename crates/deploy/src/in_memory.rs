//! A simulated development chain living inside the process.
//!
//! Nothing is executed: the chain only keeps the bookkeeping a deployment
//! needs. Addresses follow the CREATE rule from the well-known development
//! account, so a fresh process deploys its first contract at the same address
//! as a fresh development node would.

use std::{collections::HashMap, sync::Mutex};

use alloy_core::primitives::{Address, B256, Bytes, address, keccak256};
use anyhow::Result;

use crate::{ChainBackend, DeployRequest, DeploymentReceipt};

/// Development account 0 of the standard test mnemonic.
pub const DEV_ACCOUNT_ADDRESS: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

#[derive(Debug)]
struct PendingDeployment {
    nonce: u64,
    bytecode: Bytes,
}

#[derive(Debug, Default)]
struct ChainState {
    nonce: u64,
    block_number: u64,
    pending: HashMap<B256, PendingDeployment>,
    code: HashMap<Address, Bytes>,
}

#[derive(Debug)]
pub struct InMemoryChain {
    chain_id: u64,
    deployer: Address,
    state: Mutex<ChainState>,
}

impl InMemoryChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            deployer: DEV_ACCOUNT_ADDRESS,
            state: Mutex::new(ChainState::default()),
        }
    }

    /// Init code stored for a deployed contract.
    #[cfg(test)]
    fn code_at(&self, address: Address) -> Option<Bytes> {
        self.lock().ok()?.code.get(&address).cloned()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ChainState>> {
        self.state
            .lock()
            .map_err(|_| anyhow::anyhow!("In-memory chain state is poisoned"))
    }

    fn transaction_hash(&self, nonce: u64, bytecode: &Bytes) -> B256 {
        let mut preimage = Vec::with_capacity(8 + 20 + 8 + bytecode.len());
        preimage.extend_from_slice(&self.chain_id.to_be_bytes());
        preimage.extend_from_slice(self.deployer.as_slice());
        preimage.extend_from_slice(&nonce.to_be_bytes());
        preimage.extend_from_slice(bytecode);
        keccak256(preimage)
    }
}

impl ChainBackend for InMemoryChain {
    async fn submit(&self, request: &DeployRequest) -> Result<B256> {
        let mut state = self.lock()?;

        let nonce = state.nonce;
        let tx_hash = self.transaction_hash(nonce, &request.bytecode);
        state.nonce += 1;
        state.pending.insert(
            tx_hash,
            PendingDeployment {
                nonce,
                bytecode: request.bytecode.clone(),
            },
        );

        tracing::debug!(
            tx_hash = %tx_hash,
            nonce,
            chain_id = self.chain_id,
            "Deployment transaction accepted by in-memory chain"
        );

        Ok(tx_hash)
    }

    async fn wait_for_confirmation(&self, tx_hash: B256) -> Result<DeploymentReceipt> {
        let mut state = self.lock()?;

        let pending = state
            .pending
            .remove(&tx_hash)
            .ok_or_else(|| anyhow::anyhow!("Unknown transaction {}", tx_hash))?;

        // Every transaction is mined in its own block.
        state.block_number += 1;
        let contract_address = self.deployer.create(pending.nonce);
        state.code.insert(contract_address, pending.bytecode);

        Ok(DeploymentReceipt {
            tx_hash,
            contract_address,
            block_number: state.block_number,
        })
    }
}
