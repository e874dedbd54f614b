//! Composition root: wires credentials, refresh, search and insights
//! together and runs the terminal event loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use asset_search::NavEvent;
use crossterm::event::Event;
use market_core::{Asset, Insight, InsightFailure, InsightSource, MarketDataSource};
use ratatui::backend::Backend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tokio::time;

use crate::credentials::{CredentialStore, KeySlot};
use crate::input::{map_event, Action, Hit, Mode, Regions};
use crate::scheduler::{RefreshEvent, RefreshScheduler};
use crate::state::Dashboard;
use crate::ui;

const UI_TICK: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub struct InsightResolution {
    pub seq: u64,
    pub result: Result<Insight, InsightFailure>,
}

/// Receiving ends of the background work started by [`App`].
pub struct AppChannels {
    pub refresh: mpsc::UnboundedReceiver<RefreshEvent>,
    pub insights: mpsc::UnboundedReceiver<InsightResolution>,
}

pub struct App {
    dashboard: Dashboard,
    credentials: CredentialStore,
    scheduler: RefreshScheduler,
    insights: Arc<dyn InsightSource>,
    insight_tx: mpsc::UnboundedSender<InsightResolution>,
    mode: Mode,
    key_buffer: String,
    regions: Regions,
    should_quit: bool,
}

impl App {
    pub fn new(
        market: Arc<dyn MarketDataSource>,
        insights: Arc<dyn InsightSource>,
        credentials: CredentialStore,
        refresh_interval: Duration,
    ) -> (Self, AppChannels) {
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        let (insight_tx, insight_rx) = mpsc::unbounded_channel();

        let app = Self {
            dashboard: Dashboard::new(),
            credentials,
            scheduler: RefreshScheduler::new(market, refresh_interval, refresh_tx),
            insights,
            insight_tx,
            mode: Mode::Search,
            key_buffer: String::new(),
            regions: Regions::default(),
            should_quit: false,
        };
        let channels = AppChannels {
            refresh: refresh_rx,
            insights: insight_rx,
        };
        (app, channels)
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    #[cfg(test)]
    pub(crate) fn dashboard_mut(&mut self) -> &mut Dashboard {
        &mut self.dashboard
    }

    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn key_buffer(&self) -> &str {
        &self.key_buffer
    }

    pub fn has_key(&self, slot: KeySlot) -> bool {
        self.credentials.get(slot).is_some()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn set_regions(&mut self, regions: Regions) {
        self.regions = regions;
    }

    /// Activate periodic refresh with the stored market key.
    pub fn start(&mut self) {
        self.scheduler.activate(self.credentials.market_key());
    }

    /// Tear down the refresh timer; later results are ignored.
    pub fn shutdown(&mut self) {
        self.scheduler.deactivate();
        self.dashboard.deactivate();
    }

    pub fn handle_event(&mut self, event: &Event, now: Instant) {
        let action = map_event(event, self.mode);
        self.handle_action(action, now);
    }

    pub fn handle_action(&mut self, action: Action, now: Instant) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Retry => {
                self.dashboard.dismiss_error();
                if !self.scheduler.retry() {
                    self.start();
                }
            }
            Action::QueryChar(c) => self.dashboard.push_char(c),
            Action::QueryBackspace => self.dashboard.backspace(),
            Action::Nav(event) => self.navigate(event),
            Action::Escape => self.dashboard.escape(),
            Action::EditKey(slot) => {
                self.finish_key_edit();
                self.key_buffer = self.credentials.get(slot).unwrap_or_default();
                self.mode = Mode::EditKey(slot);
            }
            Action::KeyChar(c) => {
                self.key_buffer.push(c);
                self.store_key_buffer(now);
            }
            Action::KeyBackspace => {
                if self.key_buffer.pop().is_some() {
                    self.store_key_buffer(now);
                }
            }
            Action::FinishKeyEdit => self.finish_key_edit(),
            Action::ClearKeys => {
                self.mode = Mode::Search;
                self.key_buffer.clear();
                if let Err(e) = self.credentials.clear_all() {
                    tracing::warn!("Failed to clear credentials: {}", e);
                    self.dashboard.show_toast(e.to_string(), now);
                }
                self.scheduler.set_access_key(None);
            }
            Action::PointerMove { column, row } => {
                if let Hit::Suggestion(i) = self.regions.hit(column, row) {
                    self.navigate(NavEvent::Hover(i));
                }
            }
            Action::PointerClick { column, row } => match self.regions.hit(column, row) {
                Hit::Suggestion(i) => {
                    self.navigate(NavEvent::Hover(i));
                    self.navigate(NavEvent::Confirm);
                }
                Hit::Search => {}
                Hit::Outside => self.navigate(NavEvent::Dismiss),
            },
            Action::Ignore => {}
        }
    }

    pub fn apply_refresh(&mut self, event: RefreshEvent) {
        self.dashboard.apply_refresh(event);
    }

    pub fn apply_insight(&mut self, resolution: InsightResolution, now: Instant) {
        self.dashboard
            .resolve_insight(resolution.seq, resolution.result, now);
    }

    pub fn tick(&mut self, now: Instant) {
        self.dashboard.expire_toast(now);
    }

    fn navigate(&mut self, event: NavEvent) {
        if let Some(asset) = self.dashboard.navigate(event) {
            self.request_insight(&asset);
        }
    }

    fn request_insight(&mut self, asset: &Asset) {
        let seq = self.dashboard.begin_insight(&asset.name);
        let source = self.insights.clone();
        let key = self.credentials.insight_key();
        let name = asset.name.clone();
        let tx = self.insight_tx.clone();

        tracing::info!("Requesting insight #{} for {}", seq, name);
        tokio::spawn(async move {
            let result = source.request(&name, key.as_deref()).await;
            let _ = tx.send(InsightResolution { seq, result });
        });
    }

    fn store_key_buffer(&mut self, now: Instant) {
        if let Mode::EditKey(slot) = self.mode {
            if let Err(e) = self.credentials.set(slot, &self.key_buffer) {
                tracing::warn!("Failed to store {}: {}", slot.label(), e);
                self.dashboard.show_toast(e.to_string(), now);
            }
        }
    }

    fn finish_key_edit(&mut self) {
        if let Mode::EditKey(slot) = self.mode {
            self.mode = Mode::Search;
            self.key_buffer.clear();
            if slot == KeySlot::Market {
                self.scheduler.set_access_key(self.credentials.market_key());
            }
        }
    }
}

/// Drive the dashboard until the user quits.
pub async fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut channels: AppChannels,
    mut input: mpsc::UnboundedReceiver<Event>,
) -> anyhow::Result<()> {
    app.start();
    let mut ticker = time::interval(UI_TICK);

    loop {
        let mut regions = Regions::default();
        terminal.draw(|frame| regions = ui::draw(frame, &*app))?;
        app.set_regions(regions);

        tokio::select! {
            maybe_event = input.recv() => match maybe_event {
                Some(event) => app.handle_event(&event, Instant::now()),
                None => break,
            },
            Some(event) = channels.refresh.recv() => app.apply_refresh(event),
            Some(resolution) = channels.insights.recv() => app.apply_insight(resolution, Instant::now()),
            _ = ticker.tick() => app.tick(Instant::now()),
        }

        if app.should_quit() {
            break;
        }
    }

    app.shutdown();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use market_core::{FetchFailure, InsightOrigin};
    use ratatui::layout::Rect;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeMarket {
        keys: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl MarketDataSource for FakeMarket {
        async fn fetch(&self, access_key: Option<&str>) -> Result<Vec<Asset>, FetchFailure> {
            self.keys.lock().unwrap().push(access_key.map(str::to_string));
            Ok(vec![
                Asset::new("bitcoin", "Bitcoin", "btc"),
                Asset::new("bitcoin-cash", "Bitcoin Cash", "bch"),
                Asset::new("ethereum", "Ethereum", "eth"),
            ])
        }
    }

    #[derive(Default)]
    struct FakeInsights {
        keys: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl InsightSource for FakeInsights {
        async fn request(&self, asset_name: &str, access_key: Option<&str>) -> Result<Insight, InsightFailure> {
            self.keys.lock().unwrap().push(access_key.map(str::to_string));
            Ok(Insight::new(asset_name, "summary", InsightOrigin::Fallback))
        }
    }

    struct Harness {
        app: App,
        channels: AppChannels,
        market: Arc<FakeMarket>,
        insights: Arc<FakeInsights>,
    }

    fn harness(credentials: CredentialStore) -> Harness {
        let market = Arc::new(FakeMarket::default());
        let insights = Arc::new(FakeInsights::default());
        let (app, channels) = App::new(
            market.clone(),
            insights.clone(),
            credentials,
            Duration::from_secs(60),
        );
        Harness {
            app,
            channels,
            market,
            insights,
        }
    }

    impl Harness {
        async fn pump_refresh(&mut self) {
            loop {
                let event = self.channels.refresh.recv().await.unwrap();
                let done = matches!(event, RefreshEvent::Completed { .. });
                self.app.apply_refresh(event);
                if done {
                    return;
                }
            }
        }

        async fn pump_insight(&mut self) {
            let resolution = self.channels.insights.recv().await.unwrap();
            self.app.apply_insight(resolution, Instant::now());
        }

        fn act(&mut self, action: Action) {
            self.app.handle_action(action, Instant::now());
        }

        fn type_text(&mut self, text: &str, keys: bool) {
            for c in text.chars() {
                self.act(if keys { Action::KeyChar(c) } else { Action::QueryChar(c) });
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_requests_insight_for_selection() {
        let mut creds = CredentialStore::in_memory();
        creds.set(KeySlot::Insight, "gm").unwrap();
        let mut h = harness(creds);
        h.app.start();
        h.pump_refresh().await;

        h.type_text("bit", false);
        h.act(Action::Nav(NavEvent::MoveDown));
        h.act(Action::Nav(NavEvent::Confirm));
        assert_eq!(h.app.dashboard().query(), "Bitcoin");
        assert_eq!(h.app.dashboard().insight_pending(), Some("Bitcoin"));

        h.pump_insight().await;
        assert_eq!(h.app.dashboard().insight().unwrap().asset_name, "Bitcoin");
        assert_eq!(*h.insights.keys.lock().unwrap(), vec![Some("gm".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_market_key_edit_rearms_once_on_finish() {
        let mut h = harness(CredentialStore::in_memory());
        h.app.start();
        h.pump_refresh().await;

        h.act(Action::EditKey(KeySlot::Market));
        h.type_text("cg-1", true);
        assert!(h.app.has_key(KeySlot::Market));
        assert_eq!(h.app.scheduler().stats().starts, 1);

        h.act(Action::FinishKeyEdit);
        assert_eq!(h.app.mode(), Mode::Search);
        assert_eq!(h.app.scheduler().stats().starts, 2);
        assert_eq!(h.app.scheduler().stats().stops, 1);

        h.pump_refresh().await;
        assert_eq!(
            *h.market.keys.lock().unwrap(),
            vec![None, Some("cg-1".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_keys_drops_both_and_rearms() {
        let mut creds = CredentialStore::in_memory();
        creds.set(KeySlot::Market, "cg").unwrap();
        creds.set(KeySlot::Insight, "gm").unwrap();
        let mut h = harness(creds);
        h.app.start();
        h.pump_refresh().await;

        h.act(Action::ClearKeys);
        assert!(!h.app.has_key(KeySlot::Market));
        assert!(!h.app.has_key(KeySlot::Insight));

        h.pump_refresh().await;
        assert_eq!(
            *h.market.keys.lock().unwrap(),
            vec![Some("cg".to_string()), None]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pointer_click_on_suggestion_confirms() {
        let mut h = harness(CredentialStore::in_memory());
        h.app.start();
        h.pump_refresh().await;
        h.type_text("bit", false);

        h.app.set_regions(Regions {
            search: Rect::new(0, 3, 60, 3),
            suggestions: vec![Rect::new(1, 6, 40, 1), Rect::new(1, 7, 40, 1)],
        });
        h.act(Action::PointerMove { column: 3, row: 7 });
        assert_eq!(h.app.dashboard().cursor(), Some(1));

        h.act(Action::PointerClick { column: 3, row: 7 });
        assert_eq!(h.app.dashboard().query(), "Bitcoin Cash");
        h.pump_insight().await;
        assert_eq!(h.app.dashboard().insight().unwrap().asset_name, "Bitcoin Cash");
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_outside_dismisses_suggestions() {
        let mut h = harness(CredentialStore::in_memory());
        h.app.start();
        h.pump_refresh().await;
        h.type_text("eth", false);
        assert!(h.app.dashboard().suggestions_open());

        h.app.set_regions(Regions {
            search: Rect::new(0, 3, 60, 3),
            suggestions: vec![Rect::new(1, 6, 40, 1)],
        });
        h.act(Action::PointerClick { column: 10, row: 4 });
        assert!(h.app.dashboard().suggestions_open());

        h.act(Action::PointerClick { column: 10, row: 30 });
        assert!(!h.app.dashboard().suggestions_open());
        assert_eq!(h.app.dashboard().query(), "eth");
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_deactivates_refresh() {
        let mut h = harness(CredentialStore::in_memory());
        h.app.start();
        h.pump_refresh().await;

        h.act(Action::Quit);
        assert!(h.app.should_quit());
        h.app.shutdown();

        assert!(!h.app.scheduler().is_active());
        assert!(!h.app.dashboard().is_active());
    }
}
