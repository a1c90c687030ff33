//! Node configuration, grounded on `node-runtime/container/config.rs`'s
//! nested-struct-with-`Default` shape, but cut down to this ledger's actual
//! knobs: no HMAC/consensus-mode/finality sections, since there is no
//! consensus here to configure. TOML loading itself has no teacher-pack
//! precedent (no crate in the pack actually calls `config::Config::builder`
//! anywhere); it is written straight against the `config` crate's own
//! documented builder API.

use serde::Deserialize;

use crate::error::{NodeError, Result};

/// Everything a node needs to open storage, enforce chain identity, and
/// decide its own role (miner vs. follower).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub network_id: u32,
    pub chain_id: u64,
    /// Hex-encoded 64-byte (x, y) public key of the chain's single
    /// authority — every header and Emission tx must carry this key.
    pub master_pub_key: String,
    /// Hex-encoded 32-byte private key. Present only on the node acting as
    /// the chain's miner; a follower leaves this unset.
    pub miner_priv_key: Option<String>,
    /// Directory holding this node's RocksDB storage.
    pub dir: String,
    #[serde(default = "default_verify_txs_level")]
    pub verify_txs_level: u8,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// A remote peer to pull blocks from / push pending txs to. Present
    /// only on a follower.
    pub peer_url: Option<String>,
    #[serde(default)]
    pub genesis_timestamp: i64,
}

fn default_verify_txs_level() -> u8 {
    1
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Config {
    /// Load `<path>.toml` (or `<path>.json`/`.yaml`, per the `config`
    /// crate's auto-detection), overridable by `MDC_NODE_*` environment
    /// variables (e.g. `MDC_NODE_LISTEN_ADDR`).
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("MDC_NODE"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Applies CLI-supplied overrides on top of the loaded file, so a single
    /// config file can be reused across nodes that differ only in `dir` (each
    /// node's own data directory) or `peer_url` (which peer a follower pulls
    /// from).
    pub fn apply_overrides(&mut self, args: &crate::cli::Args) {
        if let Some(dir) = &args.dir {
            self.dir = dir.clone();
        }
        if let Some(level) = args.verify_txs_level {
            self.verify_txs_level = level;
        }
        if let Some(peer_url) = &args.peer_url {
            self.peer_url = Some(peer_url.clone());
        }
    }

    pub fn master_pub_key_bytes(&self) -> Result<mdc_crypto::PublicKey> {
        decode_key(&self.master_pub_key, "master_pub_key")
    }

    /// The miner's private key, if this node is configured to mine. A node
    /// that mines always signs as `master_pub_key` — there is one authority
    /// on this chain, so the miner's own key pair *is* the master key pair.
    pub fn miner_priv_key_bytes(&self) -> Result<Option<mdc_crypto::PrivateKey>> {
        self.miner_priv_key
            .as_deref()
            .map(|s| decode_key(s, "miner_priv_key"))
            .transpose()
    }
}

fn decode_key<const N: usize>(hex_str: &str, field: &'static str) -> Result<[u8; N]> {
    let bytes = hex::decode(hex_str).map_err(|source| NodeError::InvalidKeyHex { field, source })?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| NodeError::InvalidKeyLen {
        field,
        expected: N,
        actual,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::cli::Args;

    fn write_config(body: &str) -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mdc-node.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        let path_no_ext = dir.path().join("mdc-node").to_str().unwrap().to_string();
        (dir, path_no_ext)
    }

    #[test]
    fn load_applies_defaults_for_omitted_fields() {
        let (_dir, path) = write_config(
            r#"
            network_id = 1
            chain_id = 7
            master_pub_key = "aa"
            dir = "./data"
            "#,
        );

        let config = Config::load(&path).unwrap();
        assert_eq!(config.verify_txs_level, 1);
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.genesis_timestamp, 0);
        assert!(config.miner_priv_key.is_none());
        assert!(config.peer_url.is_none());
    }

    #[test]
    fn cli_overrides_replace_file_values() {
        let (_dir, path) = write_config(
            r#"
            network_id = 1
            chain_id = 7
            master_pub_key = "aa"
            dir = "./data"
            verify_txs_level = 1
            "#,
        );

        let mut config = Config::load(&path).unwrap();
        let args = Args {
            config_path: path,
            dir: Some("./other".to_string()),
            verify_txs_level: Some(0),
            peer_url: Some("http://peer:8080".to_string()),
        };
        config.apply_overrides(&args);

        assert_eq!(config.dir, "./other");
        assert_eq!(config.verify_txs_level, 0);
        assert_eq!(config.peer_url.as_deref(), Some("http://peer:8080"));
    }

    #[test]
    fn master_pub_key_bytes_rejects_the_wrong_length() {
        let (_dir, path) = write_config(
            r#"
            network_id = 1
            chain_id = 7
            master_pub_key = "aabbcc"
            dir = "./data"
            "#,
        );

        let config = Config::load(&path).unwrap();
        let err = config.master_pub_key_bytes().unwrap_err();
        assert!(matches!(err, NodeError::InvalidKeyLen { expected: 64, actual: 3, .. }));
    }
}
