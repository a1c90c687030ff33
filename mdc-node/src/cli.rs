//! Grounded on `tools/qc-admin/src/main.rs`'s `clap::Parser` usage. Only
//! `config-path` selects a file; the rest are optional overrides applied on
//! top of it, for the common case of running the same config with one knob
//! (usually `dir` or `peer-url`) changed per invocation.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "mdc-node")]
#[command(about = "A content-addressed ledger node: local mining or peer replication")]
pub struct Args {
    /// Path to the node's TOML config file (extension omitted).
    #[arg(long, default_value = "mdc-node")]
    pub config_path: String,
    /// Overrides the config file's `dir`.
    #[arg(long)]
    pub dir: Option<String>,
    /// Overrides the config file's `verify_txs_level`.
    #[arg(long)]
    pub verify_txs_level: Option<u8>,
    /// Overrides the config file's `peer_url`.
    #[arg(long)]
    pub peer_url: Option<String>,
}
