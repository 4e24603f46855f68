//! `nexus priorities`

use anyhow::{bail, Result};
use chrono::Local;
use nexus_core::report::priorities_report;
use nexus_core::{NexusConfig, PriorityWorkflow, WorkflowStatus};

use crate::cli::PrioritiesArgs;
use crate::factory::Needs;

pub async fn run(args: PrioritiesArgs, config: NexusConfig) -> Result<()> {
    let registry = super::connect(&config, Needs::PRIORITIES).await?;
    if registry.transcripts.is_none() {
        bail!("Limitless is not connected; set LIMITLESS_API_KEY");
    }
    if registry.extractor.is_none() {
        bail!("Anthropic is not configured; set ANTHROPIC_API_KEY");
    }

    println!(
        "Analyzing {} ({})",
        args.period.describe(),
        if args.dry_run { "dry run" } else { "creating to-dos" }
    );

    let workflow = PriorityWorkflow::new(registry, config.priorities.clone());
    let result = workflow.run(args.period, args.dry_run).await;

    if result.status == WorkflowStatus::NoData {
        println!("No transcripts found for {}", args.period.describe());
        return Ok(());
    }

    println!(
        "{}",
        priorities_report(
            &result,
            Local::now().date_naive(),
            config.priorities.low_confidence_threshold,
        )
    );
    Ok(())
}
