// Configuration management module
// This file handles loading and parsing of workflow settings from the
// JSON config file with a COLDSIGN__-prefixed environment overlay.
// No secret key material ever appears here; the private key stays with
// the external signer.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_EXPIRE_WINDOW_SECS: u64 = 600;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Client-SDK bridge endpoint, e.g. https://net.ton.dev/rpc
    pub network: Url,
    /// Hex public key of the wallet owner whose signature is collected
    /// out of process.
    pub public_key: String,
    /// Directory holding persisted unsigned-payload slots (defaults to
    /// the working directory).
    pub state_dir: Option<PathBuf>,
    /// Message expiration window in seconds (default 600).
    pub expire_window_secs: Option<u64>,
    /// Per-request timeout for builder and transport calls (default 30).
    pub request_timeout_secs: Option<u64>,
    pub deploy: Option<DeployConfig>,
    pub transfer: Option<TransferConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeployConfig {
    /// Path to a file holding the base64 contract image.
    pub image_path: Option<PathBuf>,
    /// Inline base64 contract image; takes precedence over image_path.
    pub image_base64: Option<String>,
    /// Wallet owners as 0x-prefixed public keys; defaults to the
    /// configured public key as sole owner.
    pub owners: Option<Vec<String>>,
    pub req_confirms: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferConfig {
    /// Deployed multisig wallet the transfer is sent from.
    pub src_address: String,
    pub dst_address: String,
    /// Amount in the chain's smallest unit.
    pub value: u64,
    pub bounce: Option<bool>,
    pub flags: Option<u8>,
    pub payload: Option<String>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("COLDSIGN").separator("__"))
            .build()
            .with_context(|| format!("load configuration from {}", path.display()))?;
        let parsed: AppConfig = cfg
            .try_deserialize()
            .context("parse configuration fields")?;
        Ok(parsed)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn expire_window(&self) -> u64 {
        self.expire_window_secs.unwrap_or(DEFAULT_EXPIRE_WINDOW_SECS)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn transfer_settings(&self) -> Result<&TransferConfig> {
        self.transfer
            .as_ref()
            .context("transfer flow needs a [transfer] section in the config")
    }

    pub fn deploy_settings(&self) -> Result<&DeployConfig> {
        self.deploy
            .as_ref()
            .context("deploy flow needs a [deploy] section in the config")
    }
}

impl DeployConfig {
    /// Resolve the contract image to base64, inline or from a file, and
    /// check it actually decodes.
    pub async fn image(&self) -> Result<String> {
        let raw = match (&self.image_base64, &self.image_path) {
            (Some(inline), _) => inline.trim().to_owned(),
            (None, Some(path)) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("read contract image {}", path.display()))?
                .trim()
                .to_owned(),
            (None, None) => {
                anyhow::bail!("deploy config needs image_base64 or image_path")
            }
        };
        STANDARD
            .decode(&raw)
            .context("contract image is not valid base64")?;
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("coldsign.json");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn minimal_config_loads_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{"network": "https://net.ton.dev/rpc", "public_key": "ab"}"#,
        );
        let cfg = AppConfig::load(&path).unwrap();
        assert_eq!(cfg.expire_window(), DEFAULT_EXPIRE_WINDOW_SECS);
        assert_eq!(
            cfg.request_timeout(),
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
        assert!(cfg.transfer_settings().is_err());
    }

    #[test]
    fn transfer_section_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{
                "network": "https://net.ton.dev/rpc",
                "public_key": "ab",
                "expire_window_secs": 120,
                "transfer": {
                    "src_address": "0:01",
                    "dst_address": "0:02",
                    "value": 1000000000
                }
            }"#,
        );
        let cfg = AppConfig::load(&path).unwrap();
        assert_eq!(cfg.expire_window(), 120);
        let transfer = cfg.transfer_settings().unwrap();
        assert_eq!(transfer.src_address, "0:01");
        assert_eq!(transfer.value, 1_000_000_000);
        assert_eq!(transfer.bounce, None);
    }

    #[tokio::test]
    async fn deploy_image_rejects_bad_base64() {
        let deploy = DeployConfig {
            image_path: None,
            image_base64: Some("not base64 at all!".into()),
            owners: None,
            req_confirms: None,
        };
        assert!(deploy.image().await.is_err());
    }

    #[tokio::test]
    async fn deploy_image_reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("wallet.tvc.b64");
        std::fs::write(&image_path, "AAEC\n").unwrap();
        let deploy = DeployConfig {
            image_path: Some(image_path),
            image_base64: None,
            owners: None,
            req_confirms: None,
        };
        assert_eq!(deploy.image().await.unwrap(), "AAEC");
    }
}
