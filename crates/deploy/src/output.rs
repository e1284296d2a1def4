//! The generated address file consumed by client code.

use std::path::{Path, PathBuf};

use alloy_core::primitives::Address;

/// A source fragment exporting a deployed contract's address:
///
/// ```js
/// export const NFTMarketplaceAddress = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressFile {
    path: PathBuf,
    contract_name: String,
}

impl AddressFile {
    pub fn new(path: impl Into<PathBuf>, contract_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contract_name: contract_name.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the exported constant, e.g. `NFTMarketplaceAddress`.
    pub fn constant_name(&self) -> String {
        format!("{}Address", self.contract_name)
    }

    /// Render the file content. The address is EIP-55 checksummed.
    pub fn render(&self, address: Address) -> String {
        format!(
            "export const {} = \"{}\"\n",
            self.constant_name(),
            address.to_checksum(None)
        )
    }

    /// Write the file, replacing any previous content.
    ///
    /// The parent directory must already exist.
    pub fn write(&self, address: Address) -> std::io::Result<()> {
        std::fs::write(&self.path, self.render(address))?;
        tracing::debug!(path = %self.path.display(), address = %address, "Address file written");
        Ok(())
    }

    /// Read back the address exported by an existing file.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    #[cfg(test)]
    pub(crate) fn read_address(&self) -> anyhow::Result<Option<Address>> {
        use anyhow::Context;

        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let prefix = format!("export const {} = \"", self.constant_name());

        let value = content
            .lines()
            .find_map(|line| line.trim().strip_prefix(prefix.as_str()))
            .and_then(|rest| rest.strip_suffix('"'))
            .with_context(|| {
                format!(
                    "{} does not export {}",
                    self.path.display(),
                    self.constant_name()
                )
            })?;

        let address = value
            .parse::<Address>()
            .with_context(|| format!("Invalid address in {}: {}", self.path.display(), value))?;

        Ok(Some(address))
    }
}

#[cfg(test)]
mod tests {
    use alloy_core::primitives::address;
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn test_render_exports_checksummed_constant() {
        let file = AddressFile::new("config.js", "NFTMarketplace");
        let content = file.render(address!("5fbdb2315678afecb367f032d93f642f64180aa3"));

        assert_eq!(
            content,
            "export const NFTMarketplaceAddress = \"0x5FbDB2315678afecb367f032d93F642f64180aa3\"\n"
        );
    }

    #[test]
    fn test_write_overwrites_previous_content() {
        let tmp = TempDir::new("output").unwrap();
        let path = tmp.path().join("config.js");
        std::fs::write(&path, "// stale content\nexport const Other = 1\n").unwrap();

        let file = AddressFile::new(&path, "NFTMarketplace");
        let first = address!("5FbDB2315678afecb367f032d93F642f64180aa3");
        let second = address!("e7f1725E7734CE288F8367e1Bb143E90bb3F0512");

        file.write(first).unwrap();
        file.write(second).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("export const").count(), 1);
        assert!(!content.contains("stale"));
        assert_eq!(file.read_address().unwrap(), Some(second));
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let tmp = TempDir::new("output").unwrap();
        let file = AddressFile::new(tmp.path().join("scripts/config.js"), "NFTMarketplace");

        let err = file.write(Address::ZERO).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn test_read_address_of_missing_file() {
        let tmp = TempDir::new("output").unwrap();
        let file = AddressFile::new(tmp.path().join("config.js"), "NFTMarketplace");
        assert_eq!(file.read_address().unwrap(), None);
    }
}
