//! Displayed-insight bookkeeping.
//!
//! Each request gets a sequence number. A resolution older than whatever is
//! currently displayed, or issued before the last dismissal, is dropped.

use market_core::{Insight, InsightFailure};

#[derive(Debug, Clone, PartialEq)]
pub enum InsightOutcome {
    Shown,
    Failed(InsightFailure),
    Stale,
}

#[derive(Debug, Default)]
pub struct InsightSlot {
    next_seq: u64,
    /// Resolutions with a lower sequence number are discarded.
    floor: u64,
    shown: Option<Insight>,
    pending: Option<(u64, String)>,
}

impl InsightSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request and return its sequence number.
    pub fn begin(&mut self, asset_name: &str) -> u64 {
        self.next_seq += 1;
        self.pending = Some((self.next_seq, asset_name.to_string()));
        self.next_seq
    }

    pub fn resolve(&mut self, seq: u64, result: Result<Insight, InsightFailure>) -> InsightOutcome {
        if matches!(&self.pending, Some((p, _)) if *p == seq) {
            self.pending = None;
        }
        if seq < self.floor {
            tracing::debug!("Discarding stale insight #{} (floor {})", seq, self.floor);
            return InsightOutcome::Stale;
        }
        match result {
            Ok(insight) => {
                self.floor = seq;
                self.shown = Some(insight);
                InsightOutcome::Shown
            }
            Err(e) => InsightOutcome::Failed(e),
        }
    }

    pub fn dismiss(&mut self) {
        self.shown = None;
        self.pending = None;
        self.floor = self.next_seq + 1;
    }

    pub fn shown(&self) -> Option<&Insight> {
        self.shown.as_ref()
    }

    /// Asset name of the most recent unresolved request.
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_ref().map(|(_, name)| name.as_str())
    }
}
