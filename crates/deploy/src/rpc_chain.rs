//! Deployment over Ethereum JSON-RPC.

use std::{fmt, time::Duration};

use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy_core::primitives::{Address, B256, Bytes, TxKind, U64, U128};
use alloy_eips::eip2718::Encodable2718;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use url::Url;

use crate::{
    ChainBackend, ConfigError, DeployError, DeployRequest, DeploymentReceipt, NetworkKind,
    NetworkProfile, rpc,
};

/// Lower bound on the delay between polls of the endpoint.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Who signs the deployment transaction.
enum Sender {
    /// Sign locally and send a raw transaction.
    Local(PrivateKeySigner),
    /// Let the node sign with its first unlocked account.
    Node,
}

impl fmt::Debug for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::Local(signer) => f.debug_tuple("Local").field(&signer.address()).finish(),
            Sender::Node => f.write_str("Node"),
        }
    }
}

/// Fee parameters for the deployment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeeParams {
    Eip1559 {
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
    },
    Legacy {
        gas_price: u128,
    },
}

impl FeeParams {
    /// Leave room for the base fee to double before the transaction is priced out.
    fn eip1559(base_fee: u128, priority_fee: u128) -> Self {
        FeeParams::Eip1559 {
            max_fee_per_gas: base_fee.saturating_mul(2).saturating_add(priority_fee),
            max_priority_fee_per_gas: priority_fee,
        }
    }
}

/// The parts of a block header needed to price a transaction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockFees {
    base_fee_per_gas: Option<U128>,
}

/// The parts of a transaction receipt needed to confirm a deployment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionReceipt {
    transaction_hash: B256,
    block_number: Option<U64>,
    contract_address: Option<Address>,
    /// Absent on pre-Byzantium chains.
    status: Option<U64>,
}

impl TransactionReceipt {
    fn into_deployment(self) -> Result<DeploymentReceipt> {
        if self.status.is_some_and(|status| status.is_zero()) {
            anyhow::bail!("Deployment transaction {} reverted", self.transaction_hash);
        }

        let block_number = self
            .block_number
            .with_context(|| format!("Receipt for {} has no block number", self.transaction_hash))?;

        let contract_address = self.contract_address.with_context(|| {
            format!(
                "Receipt for {} has no contract address (not a contract creation?)",
                self.transaction_hash
            )
        })?;

        Ok(DeploymentReceipt {
            tx_hash: self.transaction_hash,
            contract_address,
            block_number: block_number.to(),
        })
    }
}

/// A network reached over JSON-RPC.
#[derive(Debug)]
pub struct RpcChain {
    client: reqwest::Client,
    url: Url,
    network: String,
    expected_chain_id: Option<u64>,
    sender: Sender,
    confirmations: u64,
    poll_interval: Duration,
}

impl RpcChain {
    /// Build the chain client for a node or remote profile.
    pub fn from_profile(
        profile: &NetworkProfile,
        confirmations: u64,
        poll_interval: Duration,
    ) -> Result<Self, DeployError> {
        let url = profile
            .rpc_url
            .clone()
            .ok_or_else(|| ConfigError::MissingRpcUrl {
                network: profile.name.clone(),
            })?;

        let sender = match profile.kind {
            NetworkKind::Remote => {
                let key = profile
                    .signing_key
                    .as_ref()
                    .ok_or_else(|| ConfigError::MissingSigningKey {
                        network: profile.name.clone(),
                    })?;
                let signer = key.expose().trim().parse::<PrivateKeySigner>().map_err(|e| {
                    ConfigError::InvalidSigningKey {
                        network: profile.name.clone(),
                        reason: e.to_string(),
                    }
                })?;
                Sender::Local(signer)
            }
            NetworkKind::Node | NetworkKind::InMemory => Sender::Node,
        };

        let client = rpc::create_client().map_err(DeployError::Submission)?;

        Ok(Self {
            client,
            url,
            network: profile.name.clone(),
            expected_chain_id: profile.chain_id,
            sender,
            confirmations: confirmations.max(1),
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        })
    }

    /// Address deployments are sent from, when it is known without asking the node.
    #[cfg(test)]
    fn local_sender(&self) -> Option<Address> {
        match &self.sender {
            Sender::Local(signer) => Some(signer.address()),
            Sender::Node => None,
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T> {
        rpc::json_rpc_call(&self.client, self.url.as_str(), method, params).await
    }

    /// Fetch the chain id and check it against the configured one.
    async fn chain_id(&self) -> Result<u64> {
        let chain_id: U64 = self.call("eth_chainId", vec![]).await?;
        let chain_id = chain_id.to::<u64>();

        match self.expected_chain_id {
            Some(expected) if expected != chain_id => anyhow::bail!(
                "Chain id mismatch for network {}: configured {}, but the RPC endpoint reports {}",
                self.network,
                expected,
                chain_id
            ),
            _ => Ok(chain_id),
        }
    }

    async fn fees(&self) -> Result<FeeParams> {
        let block: Option<BlockFees> = self
            .call("eth_getBlockByNumber", vec![json!("latest"), json!(false)])
            .await
            .context("Failed to fetch the latest block")?;

        match block.and_then(|block| block.base_fee_per_gas) {
            Some(base_fee) => {
                let priority_fee: U128 = self
                    .call("eth_maxPriorityFeePerGas", vec![])
                    .await
                    .context("Failed to fetch the priority fee")?;
                Ok(FeeParams::eip1559(base_fee.to(), priority_fee.to()))
            }
            None => {
                let gas_price: U128 = self
                    .call("eth_gasPrice", vec![])
                    .await
                    .context("Failed to fetch the gas price")?;
                Ok(FeeParams::Legacy {
                    gas_price: gas_price.to(),
                })
            }
        }
    }

    async fn send_signed(
        &self,
        signer: &PrivateKeySigner,
        chain_id: u64,
        request: &DeployRequest,
    ) -> Result<B256> {
        let from = signer.address();

        let nonce: U64 = self
            .call("eth_getTransactionCount", vec![json!(from), json!("pending")])
            .await
            .context("Failed to fetch the account nonce")?;

        let gas_limit: U64 = self
            .call(
                "eth_estimateGas",
                vec![json!({ "from": from, "data": request.bytecode })],
            )
            .await
            .context("Failed to estimate deployment gas")?;

        let fees = self.fees().await?;

        tracing::info!(
            from = %from,
            nonce = nonce.to::<u64>(),
            gas_limit = gas_limit.to::<u64>(),
            fees = ?fees,
            "Sending signed deployment transaction..."
        );

        let raw = sign_deployment(
            signer,
            chain_id,
            nonce.to(),
            gas_limit.to(),
            fees,
            request.bytecode.clone(),
        )?;

        self.call(
            "eth_sendRawTransaction",
            vec![json!(format!("0x{}", hex::encode(raw)))],
        )
        .await
    }

    async fn send_from_node(&self, request: &DeployRequest) -> Result<B256> {
        let accounts: Vec<Address> = self
            .call("eth_accounts", vec![])
            .await
            .context("Failed to list node accounts")?;

        let from = accounts
            .first()
            .copied()
            .context("The node has no unlocked accounts to deploy from")?;

        tracing::info!(from = %from, "Sending deployment transaction through the node...");

        self.call(
            "eth_sendTransaction",
            vec![json!({ "from": from, "data": request.bytecode })],
        )
        .await
    }

    /// Poll until `block_number` has `confirmations - 1` blocks on top of it.
    async fn wait_for_depth(&self, block_number: u64) -> Result<()> {
        let target = block_number.saturating_add(self.confirmations - 1);

        loop {
            let head: U64 = self.call("eth_blockNumber", vec![]).await?;
            let head = head.to::<u64>();
            if head >= target {
                return Ok(());
            }

            tracing::trace!(head, target, "Waiting for confirmations...");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl ChainBackend for RpcChain {
    async fn submit(&self, request: &DeployRequest) -> Result<B256> {
        let chain_id = self.chain_id().await?;

        let tx_hash = match &self.sender {
            Sender::Local(signer) => self.send_signed(signer, chain_id, request).await?,
            Sender::Node => self.send_from_node(request).await?,
        };

        tracing::info!(
            tx_hash = %tx_hash,
            network = %self.network,
            chain_id,
            "Deployment transaction submitted"
        );

        Ok(tx_hash)
    }

    async fn wait_for_confirmation(&self, tx_hash: B256) -> Result<DeploymentReceipt> {
        let receipt = loop {
            let receipt: Option<TransactionReceipt> = self
                .call("eth_getTransactionReceipt", vec![json!(tx_hash)])
                .await
                .context("Failed to fetch the transaction receipt")?;

            match receipt {
                Some(receipt) => break receipt.into_deployment()?,
                None => {
                    tracing::trace!(tx_hash = %tx_hash, "Transaction not mined yet");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        };

        if self.confirmations > 1 {
            tracing::info!(
                block_number = receipt.block_number,
                confirmations = self.confirmations,
                "Transaction mined, waiting for confirmations..."
            );
            self.wait_for_depth(receipt.block_number).await?;
        }

        Ok(receipt)
    }
}

/// Build and sign a contract-creation transaction, returning its EIP-2718 encoding.
fn sign_deployment(
    signer: &PrivateKeySigner,
    chain_id: u64,
    nonce: u64,
    gas_limit: u64,
    fees: FeeParams,
    input: Bytes,
) -> Result<Vec<u8>> {
    let envelope: TxEnvelope = match fees {
        FeeParams::Eip1559 {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        } => {
            let tx = TxEip1559 {
                chain_id,
                nonce,
                gas_limit,
                max_fee_per_gas,
                max_priority_fee_per_gas,
                to: TxKind::Create,
                input,
                ..Default::default()
            };
            let signature = signer
                .sign_hash_sync(&tx.signature_hash())
                .context("Failed to sign deployment transaction")?;
            tx.into_signed(signature).into()
        }
        FeeParams::Legacy { gas_price } => {
            let tx = TxLegacy {
                chain_id: Some(chain_id),
                nonce,
                gas_price,
                gas_limit,
                to: TxKind::Create,
                input,
                ..Default::default()
            };
            let signature = signer
                .sign_hash_sync(&tx.signature_hash())
                .context("Failed to sign deployment transaction")?;
            tx.into_signed(signature).into()
        }
    };

    Ok(envelope.encoded_2718())
}
