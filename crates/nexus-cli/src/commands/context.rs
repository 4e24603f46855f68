//! `nexus context`

use anyhow::Result;
use nexus_core::report::context_summary;
use nexus_core::{NexusConfig, SyncService};

use crate::cli::ContextArgs;
use crate::factory::Needs;

pub async fn run(args: ContextArgs, config: NexusConfig) -> Result<()> {
    let registry = super::connect(&config, Needs::CONTEXT).await?;
    let service = SyncService::new(registry, config.sync.clone());

    let context = service.upcoming_context(args.days).await;
    print!("{}", context_summary(&context, args.days));
    Ok(())
}
