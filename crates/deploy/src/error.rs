//! Error taxonomy for a deployment run.

use std::path::PathBuf;

/// Errors raised while resolving the network profile or run settings.
///
/// All of these surface before any network call is attempted.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown network '{name}' (known networks: {known})")]
    UnknownNetwork { name: String, known: String },

    #[error("network '{network}' requires the environment variable {var} to be set")]
    MissingEnv { network: String, var: String },

    #[error("invalid RPC URL for network '{network}': {source}")]
    InvalidUrl {
        network: String,
        #[source]
        source: url::ParseError,
    },

    #[error("network '{network}' has no RPC URL")]
    MissingRpcUrl { network: String },

    #[error("network '{network}' has no signing key")]
    MissingSigningKey { network: String },

    #[error("invalid signing key for network '{network}': {reason}")]
    InvalidSigningKey { network: String, reason: String },

    #[error("failed to load deployment settings: {0}")]
    Settings(#[from] Box<figment::Error>),
}

/// The failure of a deployment run, classified by the stage that produced it.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("contract artifact error: {0:#}")]
    Artifact(#[source] anyhow::Error),

    #[error("deployment submission failed: {0:#}")]
    Submission(#[source] anyhow::Error),

    #[error("deployment was not confirmed: {0:#}")]
    Confirmation(#[source] anyhow::Error),

    #[error("failed to write deployment address to {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DeployError {
    /// Short name of the failing stage, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            DeployError::Config(_) => "config",
            DeployError::Artifact(_) => "artifact",
            DeployError::Submission(_) => "submission",
            DeployError::Confirmation(_) => "confirmation",
            DeployError::Output { .. } => "output",
        }
    }
}
