//! Subcommand implementations.

pub mod context;
pub mod priorities;
pub mod sync;

use anyhow::{bail, Result};
use nexus_core::{ConnectionStatus, NexusConfig, ServiceRegistry};

use crate::factory::{build_registry, Needs};

/// Build and probe the adapters a command needs.
///
/// Fails when nothing could be reached, so commands never run against an
/// empty registry.
pub async fn connect(config: &NexusConfig, needs: Needs) -> Result<ServiceRegistry> {
    let mut registry = build_registry(config, needs);
    let status = registry.connect_all().await;
    print_status(&status);

    if !status.any_connected() {
        bail!("no service connected; check the credentials in your configuration");
    }
    Ok(registry)
}

fn print_status(status: &ConnectionStatus) {
    println!("Services:");
    for (service, state) in status.entries() {
        println!("  {:<16} {}", service, state);
    }
    println!();
}
