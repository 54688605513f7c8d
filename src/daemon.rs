//! Periodic background sync.
//!
//! Each tick refreshes every stored feed within the configured time budget.
//! Feeds that don't finish in time are abandoned for that cycle, and the
//! cycle still counts as completed.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};

use crate::app::{AppContext, Result};
use crate::sync::{CancelToken, SyncReport, SyncScope};

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Update interval in seconds (default: 3600 = 1 hour)
    pub update_interval_secs: u64,
    /// Whether to run an update immediately on start
    pub update_on_start: bool,
    /// Time budget per cycle
    pub budget: Duration,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            update_interval_secs: 3600,
            update_on_start: true,
            budget: Duration::from_secs(25),
        }
    }
}

impl DaemonConfig {
    /// Parse interval string like "1h", "30m", "6h", "1d"
    pub fn parse_interval(s: &str) -> std::result::Result<u64, String> {
        let s = s.trim().to_lowercase();

        let secs = if let Some(hours) = s.strip_suffix('h') {
            hours
                .parse::<u64>()
                .ok()
                .and_then(|h| h.checked_mul(3600))
                .ok_or_else(|| format!("Invalid hours: {}", hours))
        } else if let Some(minutes) = s.strip_suffix('m') {
            minutes
                .parse::<u64>()
                .ok()
                .and_then(|m| m.checked_mul(60))
                .ok_or_else(|| format!("Invalid minutes: {}", minutes))
        } else if let Some(days) = s.strip_suffix('d') {
            days.parse::<u64>()
                .ok()
                .and_then(|d| d.checked_mul(86400))
                .ok_or_else(|| format!("Invalid days: {}", days))
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse::<u64>()
                .map_err(|_| format!("Invalid seconds: {}", secs))
        } else {
            s.parse::<u64>()
                .map_err(|_| format!("Invalid interval: {}. Use format like '1h', '30m', '1d'", s))
        }?;

        if secs == 0 {
            return Err("Interval must be greater than zero".to_string());
        }
        Ok(secs)
    }

    /// Format interval for display
    pub fn format_interval(secs: u64) -> String {
        if secs >= 86400 && secs % 86400 == 0 {
            format!("{}d", secs / 86400)
        } else if secs >= 3600 && secs % 3600 == 0 {
            format!("{}h", secs / 3600)
        } else if secs >= 60 && secs % 60 == 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }
}

pub struct Daemon<'a> {
    ctx: &'a AppContext,
    config: DaemonConfig,
}

impl<'a> Daemon<'a> {
    pub fn new(ctx: &'a AppContext, config: DaemonConfig) -> Self {
        Self { ctx, config }
    }

    /// Runs until SIGINT/SIGTERM. A cycle in flight at shutdown is cancelled
    /// and allowed to wind down before returning.
    pub async fn run(&self) -> Result<()> {
        tracing::info!(
            interval = %DaemonConfig::format_interval(self.config.update_interval_secs),
            budget_secs = self.config.budget.as_secs(),
            "daemon started"
        );

        let mut timer = interval(Duration::from_secs(self.config.update_interval_secs));
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        if !self.config.update_on_start {
            // The first tick fires immediately.
            timer.tick().await;
        }

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = timer.tick() => {
                    let cancel = CancelToken::new();
                    let cycle = self.run_cycle(&cancel);
                    tokio::pin!(cycle);

                    tokio::select! {
                        _ = &mut cycle => {}
                        _ = &mut shutdown => {
                            cancel.cancel();
                            cycle.await;
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("daemon shutting down");
        Ok(())
    }

    /// One background cycle. Always completes; failures are only logged.
    pub async fn run_cycle(&self, cancel: &CancelToken) -> Option<SyncReport> {
        match self
            .ctx
            .sync
            .request_sync(SyncScope::All, Some(self.config.budget), cancel)
            .await
        {
            Ok(report) => {
                for failure in &report.failed {
                    tracing::warn!(feed = %failure.url, error = %failure.error, "background sync failed");
                }
                if !report.is_complete() {
                    tracing::warn!(
                        unfinished = report.unfinished.len(),
                        "background budget exhausted"
                    );
                }
                Some(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "could not load feeds for background sync");
                None
            }
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {},
                    _ = sigint.recv() => {},
                }
            }
            _ => {
                tracing::warn!("signal handlers unavailable, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval() {
        assert_eq!(DaemonConfig::parse_interval("1h").unwrap(), 3600);
        assert_eq!(DaemonConfig::parse_interval("30m").unwrap(), 1800);
        assert_eq!(DaemonConfig::parse_interval("1d").unwrap(), 86400);
        assert_eq!(DaemonConfig::parse_interval("60s").unwrap(), 60);
        assert_eq!(DaemonConfig::parse_interval("3600").unwrap(), 3600);
        assert_eq!(DaemonConfig::parse_interval(" 6H ").unwrap(), 21600);
        assert!(DaemonConfig::parse_interval("invalid").is_err());
        assert!(DaemonConfig::parse_interval("0m").is_err());
    }

    #[test]
    fn test_parse_interval_rejects_overflow() {
        assert_eq!(
            DaemonConfig::parse_interval("999999999999999999h"),
            Err("Invalid hours: 999999999999999999".to_string())
        );
        assert!(DaemonConfig::parse_interval("999999999999999999m").is_err());
        assert!(DaemonConfig::parse_interval("999999999999999999d").is_err());
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(DaemonConfig::format_interval(3600), "1h");
        assert_eq!(DaemonConfig::format_interval(1800), "30m");
        assert_eq!(DaemonConfig::format_interval(86400), "1d");
        assert_eq!(DaemonConfig::format_interval(90), "90s");
        assert_eq!(DaemonConfig::format_interval(7200), "2h");
    }

    #[tokio::test]
    async fn test_cycle_with_no_feeds_completes() {
        let ctx = AppContext::in_memory(crate::config::Config::default()).unwrap();
        let daemon = Daemon::new(&ctx, DaemonConfig::default());

        let report = daemon.run_cycle(&CancelToken::new()).await.unwrap();
        assert!(report.is_complete());
        assert!(report.succeeded.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_cycle_does_not_poison_the_next() {
        let ctx = AppContext::in_memory(crate::config::Config::default()).unwrap();
        let daemon = Daemon::new(&ctx, DaemonConfig::default());

        let cancelled = CancelToken::new();
        cancelled.cancel();
        assert!(daemon.run_cycle(&cancelled).await.unwrap().cancelled);

        let report = daemon.run_cycle(&CancelToken::new()).await.unwrap();
        assert!(!report.cancelled);
        assert!(report.is_complete());
    }
}
