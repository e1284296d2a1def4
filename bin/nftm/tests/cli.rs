//! End-to-end tests for the `nftm` binary.
//!
//! Each test runs the compiled binary in a fresh temporary project directory
//! with an empty environment, and checks the exit code, stderr and the
//! generated address file.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempdir::TempDir;

const ARTIFACT: &str = r#"{
    "_format": "hh-sol-artifact-1",
    "contractName": "NFTMarketplace",
    "sourceName": "contracts/NFTMarketplace.sol",
    "abi": [],
    "bytecode": "0x6080604052348015600f57600080fd5b50",
    "deployedBytecode": "0x6080604052600080fd",
    "linkReferences": {},
    "deployedLinkReferences": {}
}"#;

const FIRST_LOCAL_ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// A temporary project with compiled artifacts and a `scripts/` directory.
struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let dir = TempDir::new("nftm-cli").expect("Failed to create temp dir");

        let artifact_dir = dir.path().join("artifacts/contracts/NFTMarketplace.sol");
        std::fs::create_dir_all(&artifact_dir).unwrap();
        std::fs::write(artifact_dir.join("NFTMarketplace.json"), ARTIFACT).unwrap();
        std::fs::create_dir_all(dir.path().join("scripts")).unwrap();

        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn output_file(&self) -> PathBuf {
        self.path().join("scripts/config.js")
    }

    fn run(&self, args: &[&str], envs: &[(&str, &str)]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_nftm"))
            .args(args)
            .current_dir(self.path())
            .env_clear()
            .envs(envs.iter().copied())
            .output()
            .expect("Failed to run nftm")
    }
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_local_deploy_without_arguments_or_env() {
    let project = Project::new();

    let output = project.run(&[], &[]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        FIRST_LOCAL_ADDRESS
    );

    let content = std::fs::read_to_string(project.output_file()).unwrap();
    assert_eq!(
        content,
        format!("export const NFTMarketplaceAddress = \"{FIRST_LOCAL_ADDRESS}\"\n")
    );
}

#[test]
fn test_second_run_overwrites_address_file() {
    let project = Project::new();

    assert!(project.run(&[], &[]).status.success());
    let output = project.run(&["--out", "scripts/config.js"], &[]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let content = std::fs::read_to_string(project.output_file()).unwrap();
    assert_eq!(content.matches("export const").count(), 1);
}

#[test]
fn test_missing_signing_key_exits_with_failure() {
    let project = Project::new();

    let output = project.run(
        &["--network", "testnet"],
        &[("POLYGON_MUMBAI_TESTNET_URL", "http://127.0.0.1:1")],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("ACCOUNTS_PRIVATE_KEY"));
    assert!(!project.output_file().exists());
}

#[test]
fn test_network_selected_from_env() {
    let project = Project::new();

    let output = project.run(&[], &[("NFTM_NETWORK", "mainnet")]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("POLYGON_MAINNET_URL"));
    assert!(!project.output_file().exists());
}

#[test]
fn test_failed_submission_leaves_previous_file_untouched() {
    let project = Project::new();
    let previous = format!("export const NFTMarketplaceAddress = \"{FIRST_LOCAL_ADDRESS}\"\n");
    std::fs::write(project.output_file(), &previous).unwrap();

    // Nothing listens on port 1, so the first RPC call fails.
    let output = project.run(
        &["--network", "testnet"],
        &[
            ("POLYGON_MUMBAI_TESTNET_URL", "http://127.0.0.1:1"),
            ("ACCOUNTS_PRIVATE_KEY", DEV_KEY),
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("deployment submission failed"));
    assert_eq!(
        std::fs::read_to_string(project.output_file()).unwrap(),
        previous
    );
}

#[test]
fn test_failed_submission_creates_no_file() {
    let project = Project::new();

    let output = project.run(
        &["--network", "testnet"],
        &[
            ("POLYGON_MUMBAI_TESTNET_URL", "http://127.0.0.1:1"),
            ("ACCOUNTS_PRIVATE_KEY", DEV_KEY),
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Error:"));
    assert!(!project.output_file().exists());
}

#[test]
fn test_settings_file_selects_contract_and_output() {
    let project = Project::new();
    std::fs::write(
        project.path().join("Deploy.toml"),
        "contract = \"contracts/NFTMarketplace.sol:NFTMarketplace\"\noutput = \"deployed.js\"\n",
    )
    .unwrap();

    let output = project.run(&[], &[]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let content = std::fs::read_to_string(project.path().join("deployed.js")).unwrap();
    assert!(content.starts_with("export const NFTMarketplaceAddress = "));
    assert!(!project.output_file().exists());
}

#[test]
fn test_missing_artifacts_exit_with_failure() {
    let project = Project::new();

    let output = project.run(&["--artifacts", "out"], &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("contract artifact error"));
}
