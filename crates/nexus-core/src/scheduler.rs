//! Continuous sync: run a cycle, sleep, repeat until cancelled.
//!
//! Each cycle runs in its own task so a panic surfaces as a join error
//! instead of tearing down the loop. A failed cycle is followed by the fixed
//! error cooldown instead of the full interval. There is no backoff.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::SyncConfig;
use crate::error::{NexusError, NexusResult};
use crate::sync::SyncCycle;
use crate::types::CycleResult;

/// Timing for the continuous loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub interval: Duration,
    pub error_cooldown: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for SchedulerConfig {
    fn from(config: &SyncConfig) -> Self {
        Self {
            interval: config.interval(),
            error_cooldown: config.error_cooldown(),
        }
    }
}

/// Totals for one `run` of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub cycles: u64,
    pub failed_cycles: u64,
}

pub struct ContinuousSync {
    cycle: Arc<dyn SyncCycle>,
    config: SchedulerConfig,
    last_result: Arc<RwLock<Option<CycleResult>>>,
}

impl ContinuousSync {
    pub fn new(cycle: Arc<dyn SyncCycle>, config: SchedulerConfig) -> Self {
        Self {
            cycle,
            config,
            last_result: Arc::new(RwLock::new(None)),
        }
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Result of the most recent successful cycle.
    pub async fn last_result(&self) -> Option<CycleResult> {
        self.last_result.read().await.clone()
    }

    /// Run a single cycle in its own task.
    pub async fn run_now(&self) -> NexusResult<CycleResult> {
        let cycle = Arc::clone(&self.cycle);
        let result = tokio::spawn(async move { cycle.run_cycle().await })
            .await
            .map_err(|e| NexusError::Internal(format!("sync cycle panicked: {}", e)))??;

        *self.last_result.write().await = Some(result.clone());
        Ok(result)
    }

    /// Loop until `cancel` fires.
    ///
    /// Cancellation is checked before each cycle and during each sleep. A
    /// cycle that has started always runs to completion.
    pub async fn run(&self, cancel: CancellationToken) -> SchedulerStats {
        info!(
            interval_secs = self.config.interval.as_secs(),
            cooldown_secs = self.config.error_cooldown.as_secs(),
            "Starting continuous sync"
        );
        let mut stats = SchedulerStats::default();

        while !cancel.is_cancelled() {
            stats.cycles += 1;
            let pause = match self.run_now().await {
                Ok(result) => {
                    info!(
                        cycle = stats.cycles,
                        synced = result.total_synced(),
                        errors = result.error_count(),
                        "Scheduled sync completed"
                    );
                    self.config.interval
                }
                Err(e) => {
                    stats.failed_cycles += 1;
                    error!(
                        cycle = stats.cycles,
                        error = %e,
                        cooldown_secs = self.config.error_cooldown.as_secs(),
                        "Scheduled sync failed"
                    );
                    self.config.error_cooldown
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        info!(
            cycles = stats.cycles,
            failed = stats.failed_cycles,
            "Stopping continuous sync"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    #[derive(Clone, Copy)]
    enum Step {
        Succeed,
        Fail,
        Panic,
    }

    /// Plays back `script`, then cancels `cancel` on the call after it.
    struct ScriptedCycle {
        script: Vec<Step>,
        calls: AtomicUsize,
        cancel: CancellationToken,
    }

    impl ScriptedCycle {
        fn new(script: Vec<Step>, cancel: CancellationToken) -> Arc<Self> {
            Arc::new(Self {
                script,
                calls: AtomicUsize::new(0),
                cancel,
            })
        }
    }

    #[async_trait]
    impl SyncCycle for ScriptedCycle {
        async fn run_cycle(&self) -> NexusResult<CycleResult> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script.get(call).copied() {
                Some(Step::Succeed) => Ok(CycleResult::new(Utc::now())),
                Some(Step::Fail) => Err(NexusError::Internal("boom".to_string())),
                Some(Step::Panic) => panic!("cycle panicked"),
                None => {
                    self.cancel.cancel();
                    Ok(CycleResult::new(Utc::now()))
                }
            }
        }
    }

    fn config() -> SchedulerConfig {
        SchedulerConfig {
            interval: Duration::from_secs(15 * 60),
            error_cooldown: Duration::from_secs(60),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_after_success_and_cooldown_after_failure() {
        let cancel = CancellationToken::new();
        let cycle = ScriptedCycle::new(vec![Step::Succeed, Step::Fail], cancel.clone());
        let scheduler = ContinuousSync::new(cycle.clone(), config());

        let started = Instant::now();
        let stats = scheduler.run(cancel).await;

        assert_eq!(stats.cycles, 3);
        assert_eq!(stats.failed_cycles, 1);
        assert_eq!(cycle.calls.load(Ordering::SeqCst), 3);
        // 15 min after the success, 60 s after the failure
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(960) && elapsed < Duration::from_secs(961));
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_cycle_triggers_cooldown() {
        let cancel = CancellationToken::new();
        let cycle = ScriptedCycle::new(vec![Step::Panic], cancel.clone());
        let scheduler = ContinuousSync::new(cycle, config());

        let started = Instant::now();
        let stats = scheduler.run(cancel).await;

        assert_eq!(stats.cycles, 2);
        assert_eq!(stats.failed_cycles, 1);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(60) && elapsed < Duration::from_secs(61));
        assert!(scheduler.last_result().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_sleep() {
        let cancel = CancellationToken::new();
        let cycle = ScriptedCycle::new(vec![Step::Succeed; 10], CancellationToken::new());
        let scheduler = Arc::new(ContinuousSync::new(cycle.clone(), config()));

        let handle = {
            let scheduler = Arc::clone(&scheduler);
            let cancel = cancel.clone();
            tokio::spawn(async move { scheduler.run(cancel).await })
        };

        tokio::time::sleep(Duration::from_secs(10)).await;
        cancel.cancel();
        let stats = handle.await.unwrap();

        assert_eq!(stats.cycles, 1);
        assert_eq!(cycle.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_start_runs_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let cycle = ScriptedCycle::new(vec![], CancellationToken::new());
        let scheduler = ContinuousSync::new(cycle.clone(), config());

        let stats = scheduler.run(cancel).await;
        assert_eq!(stats, SchedulerStats::default());
        assert_eq!(cycle.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_now_reports_failure() {
        let cycle = ScriptedCycle::new(vec![Step::Fail], CancellationToken::new());
        let scheduler = ContinuousSync::new(cycle, config());
        assert!(scheduler.run_now().await.is_err());
        assert!(scheduler.last_result().await.is_none());
    }

    #[test]
    fn test_config_from_sync_config() {
        let config = SchedulerConfig::from(&SyncConfig::default());
        assert_eq!(config.interval, Duration::from_secs(900));
        assert_eq!(config.error_cooldown, Duration::from_secs(60));
    }
}
