//! Periodic asset-list refresh.
//!
//! [`RefreshScheduler`] owns at most one running [`RefreshHandle`]. Changing
//! the access key stops the current handle before the next one starts, so two
//! timers never overlap. Stopping a handle aborts its task, including any
//! fetch still in flight; nothing it would have produced is ever delivered.

use std::sync::Arc;
use std::time::Duration;

use market_core::{Asset, FetchFailure, MarketDataSource};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshEvent {
    Started {
        generation: u64,
    },
    Completed {
        generation: u64,
        result: Result<Vec<Asset>, FetchFailure>,
    },
}

impl RefreshEvent {
    pub fn generation(&self) -> u64 {
        match self {
            RefreshEvent::Started { generation } | RefreshEvent::Completed { generation, .. } => {
                *generation
            }
        }
    }
}

/// A running refresh timer. Dropping it has the same effect as [`stop`](Self::stop).
pub struct RefreshHandle {
    generation: u64,
    access_key: Option<String>,
    trigger: Arc<Notify>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Fetch immediately, then every `period`.
    pub fn start(
        source: Arc<dyn MarketDataSource>,
        access_key: Option<String>,
        period: Duration,
        generation: u64,
        events: mpsc::UnboundedSender<RefreshEvent>,
    ) -> Self {
        let trigger = Arc::new(Notify::new());
        let task = tokio::spawn(run_refresh_loop(
            source,
            access_key.clone(),
            period,
            generation,
            events,
            trigger.clone(),
        ));

        Self {
            generation,
            access_key,
            trigger,
            task,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn access_key(&self) -> Option<&str> {
        self.access_key.as_deref()
    }

    /// Fetch now and restart the period.
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }

    pub fn stop(self) {
        tracing::debug!("Stopping refresh generation {}", self.generation);
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_refresh_loop(
    source: Arc<dyn MarketDataSource>,
    access_key: Option<String>,
    period: Duration,
    generation: u64,
    events: mpsc::UnboundedSender<RefreshEvent>,
    trigger: Arc<Notify>,
) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = trigger.notified() => {
                interval.reset();
            }
        }

        if events.send(RefreshEvent::Started { generation }).is_err() {
            break;
        }

        let result = source.fetch(access_key.as_deref()).await;
        match &result {
            Ok(assets) => tracing::info!("Refresh {} loaded {} assets", generation, assets.len()),
            Err(e) => tracing::warn!("Refresh {} failed: {}", generation, e),
        }

        if events
            .send(RefreshEvent::Completed { generation, result })
            .is_err()
        {
            break;
        }
    }
}

/// Lifecycle counters, mostly for tests and the status line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub starts: u64,
    pub stops: u64,
}

pub struct RefreshScheduler {
    source: Arc<dyn MarketDataSource>,
    period: Duration,
    events: mpsc::UnboundedSender<RefreshEvent>,
    current: Option<RefreshHandle>,
    next_generation: u64,
    stats: SchedulerStats,
}

impl RefreshScheduler {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        period: Duration,
        events: mpsc::UnboundedSender<RefreshEvent>,
    ) -> Self {
        Self {
            source,
            period,
            events,
            current: None,
            next_generation: 1,
            stats: SchedulerStats::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Generation of the running timer, if any.
    pub fn generation(&self) -> Option<u64> {
        self.current.as_ref().map(RefreshHandle::generation)
    }

    /// Start refreshing with `access_key`. Replaces any running timer.
    pub fn activate(&mut self, access_key: Option<String>) {
        self.stop_current();

        let generation = self.next_generation;
        self.next_generation += 1;
        tracing::info!(
            "Starting refresh generation {} every {}s (access key {})",
            generation,
            self.period.as_secs(),
            if access_key.is_some() { "present" } else { "absent" }
        );

        self.current = Some(RefreshHandle::start(
            self.source.clone(),
            access_key,
            self.period,
            generation,
            self.events.clone(),
        ));
        self.stats.starts += 1;
    }

    /// Re-arm with a new key. Unchanged keys leave the running timer alone.
    pub fn set_access_key(&mut self, access_key: Option<String>) {
        if let Some(current) = &self.current {
            if current.access_key() == access_key.as_deref() {
                return;
            }
            self.activate(access_key);
        }
    }

    /// Manual retry through the running timer. Returns false when inactive.
    pub fn retry(&self) -> bool {
        match &self.current {
            Some(handle) => {
                handle.trigger();
                true
            }
            None => false,
        }
    }

    pub fn deactivate(&mut self) {
        if self.stop_current() {
            tracing::info!("Refresh scheduler deactivated");
        }
    }

    fn stop_current(&mut self) -> bool {
        match self.current.take() {
            Some(handle) => {
                handle.stop();
                self.stats.stops += 1;
                true
            }
            None => false,
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.deactivate();
    }
}
