//! src/app.rs
//!
//! Defines the main `App` struct, which encapsulates the application's
//! configuration and drives the lifecycle of a single `Node`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::NodeConfig;
use crate::engine::Node;
use crate::error::Result;

/// Encapsulates the entire application: its configuration, an optional
/// bootstrap peer, and the lifecycle of the `Node` it drives.
pub struct App {
    config: NodeConfig,
    bootstrap_peer: Option<SocketAddr>,
    log_dir: PathBuf,
}

impl App {
    /// Creates a new `App` from the given configuration.
    pub fn new(config: NodeConfig) -> Self {
        Self {
            config,
            bootstrap_peer: None,
            log_dir: PathBuf::from("."),
        }
    }

    pub fn with_bootstrap(mut self, addr: SocketAddr) -> Self {
        self.bootstrap_peer = Some(addr);
        self
    }

    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = dir;
        self
    }

    /// Initializes the node, optionally bootstraps it, starts its threads,
    /// installs a Ctrl+C handler that calls `Node::shutdown`, and blocks
    /// until shutdown is requested.
    pub fn run(self) -> Result<()> {
        let mut node = Node::init(self.config, &self.log_dir)?;

        tracing::info!(
            node_id = %node.node_id(),
            addr = %node.local_addr(),
            "starting node"
        );

        if let Some(boot_addr) = self.bootstrap_peer {
            node.bootstrap(boot_addr)?;
        }

        node.run();

        let running = Arc::new(AtomicBool::new(true));
        {
            let running = Arc::clone(&running);
            ctrlc::set_handler(move || {
                tracing::info!("Ctrl+C received, initiating graceful shutdown");
                running.store(false, Ordering::SeqCst);
            })
            .expect("failed to install Ctrl+C handler");
        }

        while running.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(100));
        }

        node.shutdown();
        tracing::info!("node has shut down");
        Ok(())
    }
}
