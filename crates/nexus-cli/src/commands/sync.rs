//! `nexus sync`

use std::sync::Arc;

use anyhow::Result;
use nexus_core::report::cycle_summary;
use nexus_core::{ContinuousSync, NexusConfig, SchedulerConfig, SyncCycle, SyncService};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::SyncArgs;
use crate::factory::Needs;
use crate::shutdown_signal;

pub async fn run(args: SyncArgs, mut config: NexusConfig) -> Result<()> {
    if let Some(minutes) = args.interval {
        config.sync.interval_minutes = minutes;
        config.validate()?;
    }

    let registry = super::connect(&config, Needs::SYNC).await?;
    let service = Arc::new(SyncService::new(registry, config.sync.clone()));

    if args.once {
        let result = service.run_cycle().await?;
        print!("{}", cycle_summary(&result));
        return Ok(());
    }

    let scheduler = ContinuousSync::new(service, SchedulerConfig::from(&config.sync));
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            info!("Shutdown signal received, stopping after the current cycle");
            cancel.cancel();
        }
    });

    println!(
        "Syncing every {} minutes. Press Ctrl+C to stop.",
        config.sync.interval_minutes
    );
    let stats = scheduler.run(cancel).await;

    if let Some(result) = scheduler.last_result().await {
        println!("Last cycle:");
        print!("{}", cycle_summary(&result));
    }
    println!(
        "Stopped after {} cycles ({} failed)",
        stats.cycles, stats.failed_cycles
    );
    Ok(())
}
