//! src/main.rs
//!
//! Binary entry point. Responsible for initializing tracing, loading
//! configuration, instantiating the main `App`, and running it.

use anyhow::Context;
use gossip_node::{App, Error, NodeConfig};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = NodeConfig::load().context("failed to load configuration")?;

    let mut app = App::new(config.clone());
    if let Some(raw) = &config.bootstrap_addr {
        let addr = raw
            .parse()
            .map_err(|_| Error::InvalidAddress(raw.clone()))
            .context("invalid bootstrap_addr in configuration")?;
        app = app.with_bootstrap(addr);
    }

    if let Err(e) = app.run() {
        tracing::error!(error = %e, "node failed");
        std::process::exit(1);
    }

    Ok(())
}
