//! src/config.rs
//!
//! Defines the strongly-typed `NodeConfig` struct for all runtime parameters,
//! loaded from files and environment variables via `figment`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Top-level struct holding all node configuration.
///
/// Immutable once a `Node` has been constructed from it. Field names and
/// defaults follow the control surface and defaults table of §6: `fanout=3,
/// ttl=5, peer_limit=20, ping_interval=2s, peer_timeout=6s, seed=42,
/// pull_interval=0 (disabled), max_ihave_ids=32, pow_difficulty=0
/// (disabled)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub port: u16,
    pub fanout: usize,
    pub ttl: u32,
    pub peer_limit: usize,
    pub ping_interval_secs: u64,
    pub peer_timeout_secs: u64,
    pub seed: u64,
    /// 0 disables the hybrid pull loop.
    pub pull_interval_secs: u64,
    pub max_ihave_ids: usize,
    /// 0 disables admission PoW; `verify` is then vacuously true.
    pub pow_difficulty: u32,
    /// Optional `ip:port` of a peer to bootstrap against at startup. Parsed
    /// by the binary entry point, not here, since a malformed value should
    /// surface as a startup `Error::InvalidAddress`, not a silent default.
    pub bootstrap_addr: Option<String>,
}

impl NodeConfig {
    /// Loads configuration from `config.toml` and `GOSSIP_`-prefixed
    /// environment variables, layered over [`NodeConfig::default`].
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(NodeConfig::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("GOSSIP_"))
            .extract()
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            fanout: 3,
            ttl: 5,
            peer_limit: 20,
            ping_interval_secs: 2,
            peer_timeout_secs: 6,
            seed: 42,
            pull_interval_secs: 0,
            max_ihave_ids: 32,
            pow_difficulty: 0,
            bootstrap_addr: None,
        }
    }
}
