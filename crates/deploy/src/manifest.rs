//! The on-disk description of a deployment request.
//!
//! Expected addresses and hashes are supplied by the caller, typically
//! checked into a side repository of pre-computed deployment manifests; the
//! core never derives them itself.

use std::path::{Path, PathBuf};

use alloy_core::primitives::{Address, B256, Bytes};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{DeploymentRequest, factory};

/// The default name for the manifest file.
pub const MANIFEST_FILENAME: &str = "Crosscast.toml";

/// TOML-serializable deployment manifest.
///
/// The creation payload is given either inline as `code` (0x-prefixed hex)
/// or as `code_path`, a file containing the hex artifact; exactly one of the
/// two must be set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentManifest {
    /// Inline creation payload, 0x-prefixed hex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Path to a hex artifact file with the creation payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_path: Option<PathBuf>,
    /// The address the factory is expected to produce on every network.
    pub expected_address: Address,
    /// Hash the deployed bytecode must match post-deploy.
    pub expected_code_hash: B256,
    /// Addresses that must already carry code before deployment is
    /// attempted, in declaration order.
    #[serde(default)]
    pub dependencies: Vec<Address>,
    /// Label used in the post-deploy verification instruction.
    pub verification_label: String,
    /// The deterministic factory address.
    #[serde(default = "default_factory")]
    pub factory: Address,
}

fn default_factory() -> Address {
    factory::DETERMINISTIC_FACTORY
}

impl DeploymentManifest {
    /// Load a manifest from a TOML file.
    ///
    /// If `path` is a directory, `Crosscast.toml` inside it is read instead.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow::anyhow!(
                "Manifest file or directory not found: {}",
                path.display()
            ));
        }

        let manifest_path = if path.is_dir() {
            path.join(MANIFEST_FILENAME)
        } else {
            path.to_path_buf()
        };

        let content = std::fs::read_to_string(&manifest_path)
            .context(format!("Failed to read manifest from {}", manifest_path.display()))?;
        let manifest: Self =
            toml::from_str(&content).context("Failed to parse manifest file as TOML")?;
        tracing::info!(path = %manifest_path.display(), "Manifest loaded");
        Ok(manifest)
    }

    /// Save the manifest to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize manifest to TOML")?;
        std::fs::write(path, content)
            .context(format!("Failed to write manifest to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Manifest saved");
        Ok(())
    }

    /// Resolve the manifest into an immutable [`DeploymentRequest`].
    ///
    /// Reads the artifact file when `code_path` is used; paths are resolved
    /// relative to `base_dir` (normally the manifest's directory).
    pub fn into_request(self, base_dir: &Path) -> Result<DeploymentRequest> {
        let code_hex = match (&self.code, &self.code_path) {
            (Some(inline), None) => inline.trim().to_string(),
            (None, Some(rel_path)) => {
                let artifact_path = base_dir.join(rel_path);
                std::fs::read_to_string(&artifact_path)
                    .context(format!(
                        "Failed to read code artifact from {}",
                        artifact_path.display()
                    ))?
                    .trim()
                    .to_string()
            }
            (Some(_), Some(_)) => {
                anyhow::bail!("Manifest sets both `code` and `code_path`; pick one")
            }
            (None, None) => {
                anyhow::bail!("Manifest sets neither `code` nor `code_path`")
            }
        };

        let code = hex::decode(code_hex.trim_start_matches("0x"))
            .context("Creation payload is not valid hex")?;
        if code.is_empty() {
            anyhow::bail!("Creation payload is empty");
        }

        Ok(DeploymentRequest {
            code: Bytes::from(code),
            expected_address: self.expected_address,
            expected_code_hash: self.expected_code_hash,
            dependencies: self.dependencies,
            verification_label: self.verification_label,
            factory: self.factory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::{address, b256};
    use tempdir::TempDir;

    fn manifest() -> DeploymentManifest {
        DeploymentManifest {
            code: Some("0x60016000f3".to_string()),
            code_path: None,
            expected_address: address!("000000000000000000000000000000000000c0de"),
            expected_code_hash: b256!(
                "1111111111111111111111111111111111111111111111111111111111111111"
            ),
            dependencies: vec![address!("00000000000000000000000000000000000000aa")],
            verification_label: "Example".to_string(),
            factory: factory::DETERMINISTIC_FACTORY,
        }
    }

    #[test]
    fn test_manifest_round_trip() {
        let temp_dir = TempDir::new("crosscast-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join(MANIFEST_FILENAME);

        let original = manifest();
        original.save_to_file(&path).expect("Failed to save manifest");

        let loaded = DeploymentManifest::load_from_file(&path).expect("Failed to load manifest");
        assert_eq!(original, loaded);
    }

    #[test]
    fn test_factory_defaults_when_omitted() {
        let toml_src = r#"
            code = "0x60016000f3"
            expected_address = "0x000000000000000000000000000000000000c0de"
            expected_code_hash = "0x1111111111111111111111111111111111111111111111111111111111111111"
            verification_label = "Example"
        "#;

        let loaded: DeploymentManifest = toml::from_str(toml_src).expect("Failed to parse");
        assert_eq!(loaded.factory, factory::DETERMINISTIC_FACTORY);
        assert!(loaded.dependencies.is_empty());
    }

    #[test]
    fn test_into_request_decodes_inline_code() {
        let temp_dir = TempDir::new("crosscast-test").expect("Failed to create temp dir");

        let request = manifest()
            .into_request(temp_dir.path())
            .expect("Failed to resolve request");
        assert_eq!(request.code.as_ref(), &[0x60, 0x01, 0x60, 0x00, 0xf3]);
        assert_eq!(request.verification_label, "Example");
    }

    #[test]
    fn test_into_request_reads_artifact_file() {
        let temp_dir = TempDir::new("crosscast-test").expect("Failed to create temp dir");
        let artifact = temp_dir.path().join("creation.hex");
        std::fs::write(&artifact, "0x60016000f3\n").expect("Failed to write artifact");

        let mut manifest = manifest();
        manifest.code = None;
        manifest.code_path = Some(PathBuf::from("creation.hex"));

        let request = manifest
            .into_request(temp_dir.path())
            .expect("Failed to resolve request");
        assert_eq!(request.code.as_ref(), &[0x60, 0x01, 0x60, 0x00, 0xf3]);
    }

    #[test]
    fn test_into_request_rejects_ambiguous_code_source() {
        let temp_dir = TempDir::new("crosscast-test").expect("Failed to create temp dir");

        let mut both = manifest();
        both.code_path = Some(PathBuf::from("creation.hex"));
        assert!(both.into_request(temp_dir.path()).is_err());

        let mut neither = manifest();
        neither.code = None;
        assert!(neither.into_request(temp_dir.path()).is_err());
    }
}
