//! Application state owned by the composition root.

use std::time::{Duration, Instant};

use asset_search::{NavEvent, SearchIndex, SuggestionNavigator};
use chrono::{DateTime, Utc};
use market_core::{Asset, FetchFailure, Insight, InsightFailure};

use crate::insight::{InsightOutcome, InsightSlot};
use crate::scheduler::RefreshEvent;

pub const TOAST_TTL: Duration = Duration::from_secs(5);

/// Transient notice, e.g. a failed insight request.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub expires_at: Instant,
}

pub struct Dashboard {
    assets: Vec<Asset>,
    query: String,
    index: SearchIndex,
    navigator: SuggestionNavigator,
    loading: bool,
    error: Option<FetchFailure>,
    last_updated: Option<DateTime<Utc>>,
    insight: InsightSlot,
    toast: Option<Toast>,
    active: bool,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            assets: Vec::new(),
            query: String::new(),
            index: SearchIndex::new(),
            navigator: SuggestionNavigator::new(),
            loading: false,
            error: None,
            last_updated: None,
            insight: InsightSlot::new(),
            toast: None,
            active: true,
        }
    }

    // -- Search --------------------------------------------------------------

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.navigator.query_changed(self.query.is_empty());
    }

    pub fn push_char(&mut self, c: char) {
        self.query.push(c);
        self.navigator.query_changed(false);
    }

    pub fn backspace(&mut self) {
        if self.query.pop().is_some() {
            self.navigator.query_changed(self.query.is_empty());
        }
    }

    pub fn filtered(&self) -> Vec<&Asset> {
        self.index.filter(&self.assets, &self.query)
    }

    pub fn suggestions(&self) -> Vec<&Asset> {
        self.index.suggest(&self.assets, &self.query)
    }

    pub fn suggestions_open(&self) -> bool {
        self.navigator.is_open(self.suggestions().len())
    }

    pub fn cursor(&self) -> Option<usize> {
        self.navigator.cursor()
    }

    /// Feed a navigation event. A confirmed suggestion replaces the query
    /// with its name and is returned.
    pub fn navigate(&mut self, event: NavEvent) -> Option<Asset> {
        let len = self.suggestions().len();
        let index = self.navigator.handle(event, len)?;
        let selected = self.suggestions().get(index).map(|a| (*a).clone())?;
        self.query = selected.name.clone();
        Some(selected)
    }

    /// Esc: close suggestions first, then the insight, then the error panel.
    pub fn escape(&mut self) {
        if self.suggestions_open() {
            self.navigator.cancel();
        } else if self.insight.shown().is_some() || self.insight.pending().is_some() {
            self.insight.dismiss();
        } else {
            self.error = None;
        }
    }

    // -- Refresh -------------------------------------------------------------

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&FetchFailure> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Stop accepting refresh results.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.loading = false;
    }

    pub fn apply_refresh(&mut self, event: RefreshEvent) {
        if !self.active {
            tracing::debug!("Ignoring refresh {} after deactivation", event.generation());
            return;
        }
        match event {
            RefreshEvent::Started { .. } => self.loading = true,
            RefreshEvent::Completed { result, .. } => {
                self.loading = false;
                match result {
                    Ok(assets) => {
                        self.assets = assets;
                        self.error = None;
                        self.last_updated = Some(Utc::now());
                        let len = self.suggestions().len();
                        self.navigator.sync(len);
                    }
                    Err(e) => self.error = Some(e),
                }
            }
        }
    }

    // -- Insight -------------------------------------------------------------

    pub fn begin_insight(&mut self, asset_name: &str) -> u64 {
        self.insight.begin(asset_name)
    }

    pub fn resolve_insight(&mut self, seq: u64, result: Result<Insight, InsightFailure>, now: Instant) {
        if let InsightOutcome::Failed(e) = self.insight.resolve(seq, result) {
            self.show_toast(e.to_string(), now);
        }
    }

    pub fn insight(&self) -> Option<&Insight> {
        self.insight.shown()
    }

    pub fn insight_pending(&self) -> Option<&str> {
        self.insight.pending()
    }

    pub fn dismiss_insight(&mut self) {
        self.insight.dismiss();
    }

    // -- Notices -------------------------------------------------------------

    pub fn show_toast(&mut self, message: impl Into<String>, now: Instant) {
        self.toast = Some(Toast {
            message: message.into(),
            expires_at: now + TOAST_TTL,
        });
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn expire_toast(&mut self, now: Instant) {
        if self.toast.as_ref().is_some_and(|t| now >= t.expires_at) {
            self.toast = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_core::InsightOrigin;

    fn loaded(assets: Vec<Asset>) -> Dashboard {
        let mut dashboard = Dashboard::new();
        dashboard.apply_refresh(RefreshEvent::Started { generation: 1 });
        dashboard.apply_refresh(RefreshEvent::Completed {
            generation: 1,
            result: Ok(assets),
        });
        dashboard
    }

    fn coins() -> Vec<Asset> {
        vec![
            Asset::new("bitcoin", "Bitcoin", "btc").with_price(67000.0),
            Asset::new("ethereum", "Ethereum", "eth"),
            Asset::new("bitcoin-cash", "Bitcoin Cash", "bch"),
        ]
    }

    fn type_query(dashboard: &mut Dashboard, text: &str) {
        for c in text.chars() {
            dashboard.push_char(c);
        }
    }

    #[test]
    fn test_refresh_replaces_assets_and_clears_loading() {
        let mut dashboard = Dashboard::new();
        dashboard.apply_refresh(RefreshEvent::Started { generation: 1 });
        assert!(dashboard.is_loading());

        dashboard.apply_refresh(RefreshEvent::Completed {
            generation: 1,
            result: Ok(coins()),
        });
        assert!(!dashboard.is_loading());
        assert_eq!(dashboard.assets().len(), 3);
        assert!(dashboard.last_updated().is_some());

        dashboard.apply_refresh(RefreshEvent::Completed {
            generation: 1,
            result: Ok(vec![Asset::new("solana", "Solana", "sol")]),
        });
        assert_eq!(dashboard.assets().len(), 1);
    }

    #[test]
    fn test_failed_refresh_keeps_previous_assets() {
        let mut dashboard = loaded(coins());
        dashboard.apply_refresh(RefreshEvent::Completed {
            generation: 2,
            result: Err(FetchFailure::Network("offline".into())),
        });

        assert_eq!(dashboard.assets().len(), 3);
        assert_eq!(dashboard.error().unwrap().to_string(), "Network error: offline");

        dashboard.apply_refresh(RefreshEvent::Completed {
            generation: 2,
            result: Ok(coins()),
        });
        assert!(dashboard.error().is_none());
    }

    #[test]
    fn test_results_after_deactivation_are_ignored() {
        let mut dashboard = loaded(coins());
        dashboard.deactivate();
        dashboard.apply_refresh(RefreshEvent::Completed {
            generation: 1,
            result: Ok(Vec::new()),
        });
        assert_eq!(dashboard.assets().len(), 3);
    }

    #[test]
    fn test_typing_opens_suggestions_and_filters() {
        let mut dashboard = loaded(coins());
        assert!(!dashboard.suggestions_open());
        assert_eq!(dashboard.filtered().len(), 3);

        type_query(&mut dashboard, "bit");
        assert!(dashboard.suggestions_open());
        assert_eq!(dashboard.filtered().len(), 2);

        dashboard.backspace();
        dashboard.backspace();
        dashboard.backspace();
        assert!(!dashboard.suggestions_open());
        assert_eq!(dashboard.filtered().len(), 3);
    }

    #[test]
    fn test_confirm_sets_query_to_selected_name() {
        let mut dashboard = loaded(coins());
        type_query(&mut dashboard, "bit");
        dashboard.navigate(NavEvent::MoveDown);
        dashboard.navigate(NavEvent::MoveDown);

        let selected = dashboard.navigate(NavEvent::Confirm).unwrap();
        assert_eq!(selected.name, "Bitcoin Cash");
        assert_eq!(dashboard.query(), "Bitcoin Cash");
        assert_eq!(dashboard.cursor(), None);
        assert!(!dashboard.suggestions_open());
        assert_eq!(dashboard.filtered().len(), 1);
    }

    #[test]
    fn test_confirm_without_cursor_changes_nothing() {
        let mut dashboard = loaded(coins());
        type_query(&mut dashboard, "bit");

        assert!(dashboard.navigate(NavEvent::Confirm).is_none());
        assert_eq!(dashboard.query(), "bit");
        assert_eq!(dashboard.cursor(), None);
        assert!(dashboard.suggestions_open());
    }

    #[test]
    fn test_escaped_suggestions_cannot_be_confirmed() {
        let mut dashboard = loaded(coins());
        type_query(&mut dashboard, "bit");
        dashboard.escape();
        assert!(!dashboard.suggestions_open());

        dashboard.navigate(NavEvent::MoveDown);
        assert_eq!(dashboard.cursor(), None);
        assert!(dashboard.navigate(NavEvent::Confirm).is_none());
        assert_eq!(dashboard.query(), "bit");
    }

    #[test]
    fn test_refresh_shrinking_suggestions_clamps_cursor() {
        let mut dashboard = loaded(coins());
        type_query(&mut dashboard, "bit");
        dashboard.navigate(NavEvent::MoveDown);
        dashboard.navigate(NavEvent::MoveDown);
        assert_eq!(dashboard.cursor(), Some(1));

        dashboard.apply_refresh(RefreshEvent::Completed {
            generation: 2,
            result: Ok(vec![Asset::new("bitcoin", "Bitcoin", "btc")]),
        });
        assert_eq!(dashboard.cursor(), Some(0));

        dashboard.apply_refresh(RefreshEvent::Completed {
            generation: 3,
            result: Ok(Vec::new()),
        });
        assert_eq!(dashboard.cursor(), None);
    }

    #[test]
    fn test_escape_order() {
        let mut dashboard = loaded(coins());
        let seq = dashboard.begin_insight("Bitcoin");
        dashboard.resolve_insight(
            seq,
            Ok(Insight::new("Bitcoin", "text", InsightOrigin::Fallback)),
            Instant::now(),
        );
        type_query(&mut dashboard, "eth");

        dashboard.escape();
        assert!(!dashboard.suggestions_open());
        assert!(dashboard.insight().is_some());

        dashboard.escape();
        assert!(dashboard.insight().is_none());
    }

    #[test]
    fn test_insight_failure_shows_expiring_toast() {
        let mut dashboard = loaded(coins());
        let now = Instant::now();
        let seq = dashboard.begin_insight("Bitcoin");
        dashboard.resolve_insight(seq, Err(InsightFailure::MissingText), now);

        assert_eq!(dashboard.toast().unwrap().message, "Could not generate insight");
        dashboard.expire_toast(now + Duration::from_secs(1));
        assert!(dashboard.toast().is_some());
        dashboard.expire_toast(now + TOAST_TTL);
        assert!(dashboard.toast().is_none());
    }
}
