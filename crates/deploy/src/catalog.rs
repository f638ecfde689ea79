//! Static registry of the target networks for a deployment run.
//!
//! The catalog is configured once per run and never mutated afterwards. Its
//! order is significant: it defines both the preflight check order and the
//! deploy order, so logs and partial-failure diagnosis are reproducible
//! across runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// The default name for the networks configuration file.
pub const NETWORKS_FILENAME: &str = "Networks.toml";

/// Unique, human-readable identifier of a network within a catalog.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
    derive_more::AsRef,
)]
#[serde(transparent)]
pub struct NetworkName(String);

impl NetworkName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NetworkName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// A single target network: identifier plus the RPC endpoint the
/// environment binds to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    /// Unique name within the catalog.
    pub name: NetworkName,
    /// JSON-RPC endpoint URL.
    pub rpc_url: Url,
}

/// Error raised when a catalog cannot be constructed.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate network name in catalog: {0}")]
    DuplicateNetwork(NetworkName),
    #[error("catalog must list at least one network")]
    Empty,
}

/// Ordered, immutable list of target networks.
///
/// Reconfiguration means constructing a new catalog; there are no mutation
/// operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCatalog {
    networks: Vec<Network>,
}

impl NetworkCatalog {
    /// Build a catalog from an ordered list of networks.
    ///
    /// Rejects empty lists and duplicate names; the order of the input is
    /// preserved verbatim.
    pub fn new(networks: Vec<Network>) -> Result<Self, CatalogError> {
        if networks.is_empty() {
            return Err(CatalogError::Empty);
        }

        for (i, network) in networks.iter().enumerate() {
            if networks[..i].iter().any(|n| n.name == network.name) {
                return Err(CatalogError::DuplicateNetwork(network.name.clone()));
            }
        }

        Ok(Self { networks })
    }

    /// The networks in listed order.
    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    /// Iterate the networks in listed order.
    pub fn iter(&self) -> impl Iterator<Item = &Network> {
        self.networks.iter()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Load a catalog from a TOML file.
    ///
    /// If `path` is a directory, `Networks.toml` inside it is read instead.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "Networks file or directory not found: {}",
                path.display()
            ));
        }

        let config_path: PathBuf = if path.is_dir() {
            path.join(NETWORKS_FILENAME)
        } else {
            path.to_path_buf()
        };

        let content = std::fs::read_to_string(&config_path)
            .context(format!("Failed to read networks from {}", config_path.display()))?;
        let file: NetworksFile =
            toml::from_str(&content).context("Failed to parse networks file as TOML")?;

        let catalog = Self::new(file.networks).context("Invalid network catalog")?;
        tracing::info!(path = %config_path.display(), networks = catalog.len(), "Network catalog loaded");
        Ok(catalog)
    }

    /// Save the catalog to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = NetworksFile {
            networks: self.networks.clone(),
        };
        let content =
            toml::to_string_pretty(&file).context("Failed to serialize network catalog to TOML")?;
        std::fs::write(path, content)
            .context(format!("Failed to write networks to {}", path.display()))?;
        Ok(())
    }
}

/// On-disk shape of the networks file: a list of `[[networks]]` entries.
#[derive(Debug, Serialize, Deserialize)]
struct NetworksFile {
    networks: Vec<Network>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network(name: &str) -> Network {
        Network {
            name: NetworkName::from(name),
            rpc_url: format!("http://{name}.localhost:8545/").parse().unwrap(),
        }
    }

    #[test]
    fn test_catalog_preserves_order() {
        let catalog =
            NetworkCatalog::new(vec![network("net1"), network("net2"), network("net3")]).unwrap();

        let names: Vec<&str> = catalog.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["net1", "net2", "net3"]);
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let result = NetworkCatalog::new(vec![network("net1"), network("net2"), network("net1")]);

        assert_eq!(
            result,
            Err(CatalogError::DuplicateNetwork(NetworkName::from("net1")))
        );
    }

    #[test]
    fn test_catalog_rejects_empty_list() {
        assert_eq!(NetworkCatalog::new(vec![]), Err(CatalogError::Empty));
    }

    #[test]
    fn test_networks_file_round_trip() {
        use tempdir::TempDir;

        let temp_dir = TempDir::new("crosscast-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join(NETWORKS_FILENAME);

        let original = NetworkCatalog::new(vec![network("sepolia"), network("base")]).unwrap();
        original.save_to_file(&path).expect("Failed to save catalog");

        let loaded = NetworkCatalog::load_from_file(&path).expect("Failed to load catalog");
        assert_eq!(original, loaded);

        // Loading by directory resolves the default filename.
        let loaded_by_dir = NetworkCatalog::load_from_file(temp_dir.path())
            .expect("Failed to load catalog from directory");
        assert_eq!(original, loaded_by_dir);
    }
}
