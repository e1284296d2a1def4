//! The deployment runner: submit, wait for confirmation, write the address file.

use std::path::PathBuf;

use alloy_core::primitives::{Address, B256};

use crate::{
    AddressFile, ChainBackend, ContractArtifact, DeployConfig, DeployError, DeployRequest,
    NetworkBackend,
};

/// Stages of a deployment run. A run only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum DeployStage {
    Idle,
    Submitting,
    AwaitingConfirmation,
    WritingResult,
    Done,
    Failed,
}

/// The outcome of a successful deployment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentResult {
    pub contract_name: String,
    pub contract_address: Address,
    pub tx_hash: B256,
    pub block_number: u64,
    /// Where the address file was written.
    pub output_path: PathBuf,
}

/// Runs a single deployment against a backend.
#[derive(Debug)]
pub struct DeploymentRunner<B> {
    backend: B,
    network: String,
    output: PathBuf,
    stage: DeployStage,
}

impl<B: ChainBackend> DeploymentRunner<B> {
    pub fn new(backend: B, network: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            network: network.into(),
            output: output.into(),
            stage: DeployStage::Idle,
        }
    }

    pub fn stage(&self) -> DeployStage {
        self.stage
    }

    fn advance(&mut self, next: DeployStage) {
        debug_assert!(next > self.stage, "deployment stages only move forward");
        tracing::debug!(from = %self.stage, to = %next, "Deployment stage changed");
        self.stage = next;
    }

    /// Deploy `request` and write its address file.
    ///
    /// The address file is only written once the deployment is confirmed. A
    /// runner performs one deployment; later calls fail without side effects.
    pub async fn run(&mut self, request: DeployRequest) -> Result<DeploymentResult, DeployError> {
        if self.stage != DeployStage::Idle {
            return Err(DeployError::Submission(anyhow::anyhow!(
                "Deployment runner already used (stage: {})",
                self.stage
            )));
        }

        tracing::info!(
            contract = %request.contract_name,
            network = %self.network,
            "Deploying contract..."
        );

        match self.execute(request).await {
            Ok(result) => {
                self.advance(DeployStage::Done);
                tracing::info!(
                    contract = %result.contract_name,
                    address = %result.contract_address,
                    tx_hash = %result.tx_hash,
                    block_number = result.block_number,
                    output = %result.output_path.display(),
                    "Deployment complete"
                );
                Ok(result)
            }
            Err(err) => {
                tracing::error!(stage = %self.stage, kind = err.kind(), "Deployment failed");
                self.stage = DeployStage::Failed;

                if self.output.exists() {
                    tracing::warn!(
                        output = %self.output.display(),
                        "Address file from a previous run left untouched"
                    );
                }

                Err(err)
            }
        }
    }

    async fn execute(&mut self, request: DeployRequest) -> Result<DeploymentResult, DeployError> {
        self.advance(DeployStage::Submitting);
        let tx_hash = self
            .backend
            .submit(&request)
            .await
            .map_err(DeployError::Submission)?;

        self.advance(DeployStage::AwaitingConfirmation);
        tracing::info!(tx_hash = %tx_hash, "Waiting for deployment confirmation...");
        let receipt = self
            .backend
            .wait_for_confirmation(tx_hash)
            .await
            .map_err(DeployError::Confirmation)?;

        self.advance(DeployStage::WritingResult);
        let file = AddressFile::new(&self.output, &request.contract_name);
        file.write(receipt.contract_address)
            .map_err(|source| DeployError::Output {
                path: self.output.clone(),
                source,
            })?;

        Ok(DeploymentResult {
            contract_name: request.contract_name,
            contract_address: receipt.contract_address,
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            output_path: self.output.clone(),
        })
    }
}

/// Resolve the active network, load the artifact and run the deployment.
///
/// `lookup` reads environment variables for the network profile.
pub async fn deploy<F>(config: &DeployConfig, lookup: F) -> Result<DeploymentResult, DeployError>
where
    F: Fn(&str) -> Option<String>,
{
    let profile = config.network_profile(lookup)?;

    tracing::info!(
        network = %profile.name,
        kind = %profile.kind,
        chain_id = ?profile.chain_id,
        "Network profile resolved"
    );

    let artifact =
        ContractArtifact::find(&config.artifacts, &config.contract).map_err(DeployError::Artifact)?;
    let backend = NetworkBackend::connect(&profile, config)?;

    DeploymentRunner::new(backend, profile.name, &config.output)
        .run(artifact.into())
        .await
}
