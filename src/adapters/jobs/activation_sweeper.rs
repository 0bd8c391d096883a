//! Activation sweeper - periodic retry of stuck fulfillments.
//!
//! Runs [`SweepUnfulfilledHandler::sweep_once`] on an interval until the
//! shutdown channel flips to `true`. Optionally prunes the webhook delivery
//! journal on the same tick.
//!
//! # Usage
//!
//! ```ignore
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//! let sweeper = ActivationSweeper::with_config(sweep, config).with_journal(journal);
//!
//! tokio::spawn(async move { sweeper.run(shutdown_rx).await });
//!
//! // On shutdown:
//! shutdown_tx.send(true)?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::application::{SweepReport, SweepUnfulfilledHandler};
use crate::domain::foundation::Timestamp;
use crate::ports::WebhookDeliveryRepository;

/// Configuration for the activation sweeper.
#[derive(Debug, Clone)]
pub struct ActivationSweeperConfig {
    /// Time between sweep passes.
    pub interval: Duration,

    /// Journal rows older than this are deleted; `None` keeps everything.
    pub journal_retention: Option<chrono::Duration>,
}

impl Default for ActivationSweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            journal_retention: Some(chrono::Duration::days(30)),
        }
    }
}

impl ActivationSweeperConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_journal_retention(mut self, retention: Option<chrono::Duration>) -> Self {
        self.journal_retention = retention;
        self
    }
}

pub struct ActivationSweeper {
    sweep: Arc<SweepUnfulfilledHandler>,
    journal: Option<Arc<dyn WebhookDeliveryRepository>>,
    config: ActivationSweeperConfig,
}

impl ActivationSweeper {
    pub fn new(sweep: Arc<SweepUnfulfilledHandler>) -> Self {
        Self::with_config(sweep, ActivationSweeperConfig::default())
    }

    pub fn with_config(sweep: Arc<SweepUnfulfilledHandler>, config: ActivationSweeperConfig) -> Self {
        Self {
            sweep,
            journal: None,
            config,
        }
    }

    pub fn with_journal(mut self, journal: Arc<dyn WebhookDeliveryRepository>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Runs until `shutdown` carries `true`.
    ///
    /// Errors from a pass are logged and the loop continues; the next tick
    /// simply tries again.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        tracing::info!(interval_secs = self.config.interval.as_secs(), "Activation sweeper started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Activation sweeper stopping");
                        return;
                    }
                }

                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// One sweep pass plus journal pruning.
    pub async fn tick(&self) -> Option<SweepReport> {
        self.prune_journal().await;

        match self.sweep.sweep_once().await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::error!(error = %e, "Activation sweep failed");
                None
            }
        }
    }

    async fn prune_journal(&self) {
        let (Some(journal), Some(retention)) = (&self.journal, self.config.journal_retention) else {
            return;
        };

        match journal.delete_before(Timestamp::now().minus(retention)).await {
            Ok(0) => {}
            Ok(deleted) => tracing::info!(deleted, "Pruned webhook delivery journal"),
            Err(e) => tracing::warn!(error = %e, "Failed to prune webhook delivery journal"),
        }
    }
}
