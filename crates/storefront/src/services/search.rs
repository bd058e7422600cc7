//! Search container.
//!
//! Client-side substring search over the catalog. There is no index: every
//! query filters the full product list again.

use std::cmp::Ordering;

use serde::Serialize;

use kiosk_core::Product;

/// Current search state. Memory-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchState {
    pub query: String,
    pub results: Vec<Product>,
    pub total_results: usize,
    pub is_searching: bool,
}

/// Holds the last query and its results.
#[derive(Debug, Default)]
pub struct SearchService {
    state: SearchState,
}

impl SearchService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the trimmed query without running it.
    pub fn set_query(&mut self, query: &str) {
        query.trim().clone_into(&mut self.state.query);
    }

    /// Mark a search as in flight.
    pub const fn begin(&mut self) {
        self.state.is_searching = true;
    }

    /// Run `query` against `products` and store the outcome.
    pub fn perform_search(&mut self, products: &[Product], query: &str) -> &SearchState {
        self.set_query(query);
        self.begin();

        let results = search(products, query);
        tracing::debug!(query = %self.state.query, hits = results.len(), "Search performed");

        self.state.total_results = results.len();
        self.state.results = results;
        self.state.is_searching = false;
        &self.state
    }

    /// Reset to the empty state.
    pub fn clear(&mut self) {
        self.state = SearchState::default();
    }

    #[must_use]
    pub const fn state(&self) -> &SearchState {
        &self.state
    }
}

/// Filter `products` by a case-insensitive substring of title, category, or
/// description.
///
/// Title matches come first; within each group products are ordered by
/// descending rating, otherwise keeping catalog order. A blank query matches
/// nothing.
#[must_use]
pub fn search(products: &[Product], query: &str) -> Vec<Product> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<(bool, &Product)> = products
        .iter()
        .filter_map(|product| {
            let in_title = product.title.to_lowercase().contains(&needle);
            let matched = in_title
                || product.category.to_lowercase().contains(&needle)
                || product.description.to_lowercase().contains(&needle);
            matched.then_some((in_title, product))
        })
        .collect();

    hits.sort_by(|(a_title, a), (b_title, b)| match (a_title, b_title) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => b.rating.rate.total_cmp(&a.rating.rate),
    });

    hits.into_iter().map(|(_, product)| product.clone()).collect()
}
