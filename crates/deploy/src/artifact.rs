//! Loading compiled contract artifacts.
//!
//! The compiler itself is out of scope: this module only reads the JSON it
//! leaves behind. Both the Hardhat layout (`artifacts/contracts/<File>.sol/<Name>.json`
//! with a hex `bytecode` string) and the Foundry layout (`out/<File>.sol/<Name>.json`
//! with `bytecode.object`) are understood.

use std::path::{Path, PathBuf};

use alloy_core::primitives::Bytes;
use anyhow::{Context, Result};
use serde::Deserialize;

/// Directory holding compiler build info, never contract artifacts.
const BUILD_INFO_DIR: &str = "build-info";

/// Creation bytecode as found in an artifact file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BytecodeField {
    Hex(String),
    Object { object: String },
}

impl BytecodeField {
    fn into_hex(self) -> String {
        match self {
            BytecodeField::Hex(hex) | BytecodeField::Object { object: hex } => hex,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactFile {
    contract_name: Option<String>,
    source_name: Option<String>,
    bytecode: BytecodeField,
}

/// A compiled contract ready to be deployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractArtifact {
    pub contract_name: String,
    pub source_name: Option<String>,
    /// Creation bytecode (init code).
    pub bytecode: Bytes,
    /// Artifact file the contract was read from.
    pub path: PathBuf,
}

impl ContractArtifact {
    /// Find and load the artifact for `name` under `artifacts_dir`.
    ///
    /// `name` is either a bare contract name (`NFTMarketplace`) or a fully
    /// qualified one (`contracts/NFTMarketplace.sol:NFTMarketplace`).
    pub fn find(artifacts_dir: &Path, name: &str) -> Result<Self> {
        let path = match name.rsplit_once(':') {
            Some((source, contract)) => {
                let path = artifacts_dir.join(source).join(format!("{contract}.json"));
                if !path.is_file() {
                    anyhow::bail!(
                        "Artifact for {} not found at {}",
                        name,
                        path.display()
                    );
                }
                path
            }
            None => find_unique(artifacts_dir, name)?,
        };

        Self::load_from_file(&path)
    }

    /// Load an artifact from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read artifact {}", path.display()))?;
        let file: ArtifactFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse artifact {}", path.display()))?;

        let contract_name = match file.contract_name {
            Some(name) => name,
            None => path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .context("Artifact file name is not valid UTF-8")?
                .to_string(),
        };

        let bytecode = parse_bytecode(&file.bytecode.into_hex())
            .with_context(|| format!("Invalid bytecode for contract {}", contract_name))?;

        tracing::debug!(
            contract = %contract_name,
            path = %path.display(),
            bytecode_len = bytecode.len(),
            "Contract artifact loaded"
        );

        Ok(Self {
            contract_name,
            source_name: file.source_name,
            bytecode,
            path: path.to_path_buf(),
        })
    }
}

/// Decode the creation bytecode, rejecting artifacts that cannot be deployed.
fn parse_bytecode(raw: &str) -> Result<Bytes> {
    let hex_body = raw.trim().trim_start_matches("0x");

    if hex_body.is_empty() {
        anyhow::bail!("bytecode is empty (is it an interface or abstract contract?)");
    }

    if hex_body.contains("__") {
        anyhow::bail!("bytecode contains unlinked library placeholders");
    }

    let bytes = hex::decode(hex_body).context("bytecode is not valid hex")?;
    Ok(Bytes::from(bytes))
}

/// Find the single `<name>.json` artifact below `dir`.
fn find_unique(dir: &Path, name: &str) -> Result<PathBuf> {
    if !dir.is_dir() {
        anyhow::bail!(
            "Artifacts directory not found: {} (has the contract been compiled?)",
            dir.display()
        );
    }

    let file_name = format!("{name}.json");
    let mut matches = Vec::new();
    collect_matches(dir, &file_name, &mut matches)?;

    match matches.len() {
        0 => anyhow::bail!(
            "No artifact named {} found under {}",
            name,
            dir.display()
        ),
        1 => Ok(matches.remove(0)),
        _ => {
            matches.sort();
            let candidates = matches
                .iter()
                .map(|path| path.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            anyhow::bail!(
                "Multiple artifacts named {} found, use a fully qualified name: {}",
                name,
                candidates
            )
        }
    }
}

fn collect_matches(dir: &Path, file_name: &str, matches: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;

    for entry in entries {
        let entry = entry.context("Failed to read directory entry")?;
        let path = entry.path();

        if path.is_dir() {
            if entry.file_name() != BUILD_INFO_DIR {
                collect_matches(&path, file_name, matches)?;
            }
        } else if entry.file_name() == file_name {
            matches.push(path);
        }
    }

    Ok(())
}
