//! Coinboard: terminal dashboard for top cryptocurrency prices with
//! incremental search and short per-asset insights.

pub mod app;
pub mod config;
pub mod credentials;
pub mod input;
pub mod insight;
pub mod scheduler;
pub mod state;
pub mod ui;

pub use app::{App, AppChannels, InsightResolution};
pub use config::{ConfigError, DashboardConfig};
pub use credentials::{CredentialStore, FileStore, KeySlot, MemoryStore, StorageError};
pub use scheduler::{RefreshEvent, RefreshHandle, RefreshScheduler};
pub use state::Dashboard;
