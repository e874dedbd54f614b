//! Canned insights used when no generation key is configured.

use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};

const TEMPLATES: [&str; 4] = [
    "{name} is one of the most actively tracked assets in the market. Its price reflects broad sentiment across exchanges and can move sharply on news. Consider reviewing recent volume alongside the 24h change before drawing conclusions.",
    "{name} trades around the clock, so its price can shift quickly outside regular market hours. Market capitalization and trading volume give a rough sense of its liquidity. Add an insight key for a generated summary.",
    "{name} is listed among the top assets by market capitalization. Short-term moves are common and often follow the wider crypto market. Past performance is not a reliable guide to future returns.",
    "{name} draws attention from both long-term holders and short-term traders. Its 24h change is a snapshot, not a trend. Compare it with peers in the table for context.",
];

pub fn template_count() -> usize {
    TEMPLATES.len()
}

/// Fill template `index` (taken modulo the template count) with `asset_name`.
pub fn fallback_text(asset_name: &str, index: usize) -> String {
    TEMPLATES[index % TEMPLATES.len()].replace("{name}", asset_name)
}

/// Chooses which canned template to use next.
#[derive(Debug, Default)]
pub enum FallbackSelector {
    /// Uniformly random pick per request.
    #[default]
    Random,
    /// Cycles through templates starting at the given offset.
    Rotating(AtomicUsize),
    /// Always the same template.
    Fixed(usize),
}

impl FallbackSelector {
    pub fn rotating() -> Self {
        FallbackSelector::Rotating(AtomicUsize::new(0))
    }

    pub fn next_index(&self) -> usize {
        match self {
            FallbackSelector::Random => rand::thread_rng().gen_range(0..TEMPLATES.len()),
            FallbackSelector::Rotating(counter) => {
                counter.fetch_add(1, Ordering::Relaxed) % TEMPLATES.len()
            }
            FallbackSelector::Fixed(i) => i % TEMPLATES.len(),
        }
    }
}
