//! Substring Search Module
//!
//! Case-insensitive containment match against an asset's name or symbol.
//! No ranking: results keep the input list's order.

use market_core::Asset;

/// Upper bound on autocomplete suggestions
pub const MAX_SUGGESTIONS: usize = 8;

/// Stateless matcher over a borrowed asset list
#[derive(Debug, Clone)]
pub struct SearchIndex {
    max_suggestions: usize,
}

impl Default for SearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchIndex {
    pub fn new() -> Self {
        Self {
            max_suggestions: MAX_SUGGESTIONS,
        }
    }

    /// Create an index with a lower suggestion cap. Values above
    /// [`MAX_SUGGESTIONS`] are clamped to it.
    pub fn with_max_suggestions(max_suggestions: usize) -> Self {
        Self {
            max_suggestions: max_suggestions.min(MAX_SUGGESTIONS),
        }
    }

    pub fn max_suggestions(&self) -> usize {
        self.max_suggestions
    }

    /// Every asset matching `query`, in input order. An empty query matches
    /// everything.
    pub fn filter<'a>(&self, assets: &'a [Asset], query: &str) -> Vec<&'a Asset> {
        if query.is_empty() {
            return assets.iter().collect();
        }
        let needle = query.to_lowercase();
        assets.iter().filter(|a| matches(a, &needle)).collect()
    }

    /// First matches for the autocomplete list. Empty for an empty query.
    pub fn suggest<'a>(&self, assets: &'a [Asset], query: &str) -> Vec<&'a Asset> {
        if query.is_empty() {
            return Vec::new();
        }
        let needle = query.to_lowercase();
        assets
            .iter()
            .filter(|a| matches(a, &needle))
            .take(self.max_suggestions)
            .collect()
    }
}

/// `needle` must already be lowercase.
fn matches(asset: &Asset, needle: &str) -> bool {
    asset.name.to_lowercase().contains(needle) || asset.symbol.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str, symbol: &str) -> Asset {
        Asset::new(name.to_lowercase().replace(' ', "-"), name, symbol)
    }

    fn sample() -> Vec<Asset> {
        vec![
            asset("Bitcoin", "btc"),
            asset("Ethereum", "eth"),
            asset("Bitcoin Cash", "bch"),
            asset("Tether", "usdt"),
            asset("Wrapped Bitcoin", "wbtc"),
        ]
    }

    fn names(found: &[&Asset]) -> Vec<String> {
        found.iter().map(|a| a.name.clone()).collect()
    }

    #[test]
    fn test_empty_query_filter_is_identity() {
        let assets = sample();
        let index = SearchIndex::new();

        let filtered: Vec<Asset> = index.filter(&assets, "").into_iter().cloned().collect();
        assert_eq!(filtered, assets);
        assert!(index.suggest(&assets, "").is_empty());
    }

    #[test]
    fn test_name_and_symbol_match_case_insensitively() {
        let assets = sample();
        let index = SearchIndex::new();

        assert_eq!(
            names(&index.filter(&assets, "bit")),
            vec!["Bitcoin", "Bitcoin Cash", "Wrapped Bitcoin"]
        );
        assert_eq!(names(&index.filter(&assets, "BCH")), vec!["Bitcoin Cash"]);
        assert_eq!(names(&index.filter(&assets, "ETH")), vec!["Ethereum", "Tether"]);
        assert!(index.filter(&assets, "doge").is_empty());
    }

    #[test]
    fn test_bitcoin_cash_scenario() {
        let assets = vec![asset("Bitcoin", "btc"), asset("Bitcoin Cash", "bch")];
        let index = SearchIndex::new();

        assert_eq!(names(&index.filter(&assets, "bit")), vec!["Bitcoin", "Bitcoin Cash"]);
        assert_eq!(names(&index.filter(&assets, "bch")), vec!["Bitcoin Cash"]);
    }

    #[test]
    fn test_no_tokenization_or_fuzzy_matching() {
        let assets = sample();
        let index = SearchIndex::new();

        assert!(index.filter(&assets, "btccash").is_empty());
        assert!(index.filter(&assets, "bitcion").is_empty());
        assert_eq!(names(&index.filter(&assets, "n c")), vec!["Bitcoin Cash"]);
    }

    #[test]
    fn test_suggest_is_capped_prefix_of_filter() {
        let assets: Vec<Asset> = (0..20)
            .map(|i| asset(&format!("Coin {}", i), &format!("c{}", i)))
            .collect();
        let index = SearchIndex::new();

        let filtered = index.filter(&assets, "coin");
        let suggested = index.suggest(&assets, "coin");
        assert_eq!(filtered.len(), 20);
        assert_eq!(suggested.len(), MAX_SUGGESTIONS);
        assert_eq!(suggested[..], filtered[..MAX_SUGGESTIONS]);

        // Fewer matches than the cap: suggestions equal the filter
        let filtered = index.filter(&assets, "coin 7");
        let suggested = index.suggest(&assets, "coin 7");
        assert!(filtered.len() <= MAX_SUGGESTIONS);
        assert_eq!(suggested, filtered);
    }

    #[test]
    fn test_inputs_untouched() {
        let assets = sample();
        let before = assets.clone();
        let index = SearchIndex::new();

        let _ = index.filter(&assets, "bit");
        let _ = index.suggest(&assets, "bit");
        assert_eq!(assets, before);
        assert_eq!(index.filter(&assets, "bit"), index.filter(&assets, "bit"));
    }

    #[test]
    fn test_custom_cap() {
        let assets = sample();
        let index = SearchIndex::with_max_suggestions(2);
        assert_eq!(names(&index.suggest(&assets, "bit")), vec!["Bitcoin", "Bitcoin Cash"]);
    }

    #[test]
    fn test_cap_never_exceeds_default() {
        let index = SearchIndex::with_max_suggestions(50);
        assert_eq!(index.max_suggestions(), MAX_SUGGESTIONS);

        let many: Vec<Asset> = (0..20)
            .map(|i| Asset::new(format!("coin-{}", i), format!("Coin {}", i), "cn"))
            .collect();
        assert_eq!(index.suggest(&many, "coin").len(), MAX_SUGGESTIONS);
    }
}
