//! Asset Search Module
//!
//! Incremental substring search over the asset list and the keyboard/pointer
//! selection state for its autocomplete suggestions.

pub mod index;
pub mod navigator;

pub use index::{SearchIndex, MAX_SUGGESTIONS};
pub use navigator::{NavEvent, SuggestionNavigator};
