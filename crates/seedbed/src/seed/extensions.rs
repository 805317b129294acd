//! Active extension list and theme selection.

use crate::store::{Store, StoreError};

/// Sorted set of active extension identifiers, scored by activation order.
pub const ACTIVE_EXTENSIONS_KEY: &str = "plugins:active";

/// Extensions every suite runs with.
pub const BASELINE_EXTENSIONS: &[&str] = &[
    "nodebb-plugin-dbsearch",
    "nodebb-widget-essentials",
    "nodebb-plugin-composer-default",
];

/// Theme selected after seeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Theme source, `local` for installed packages.
    pub kind: &'static str,
    /// Package identifier.
    pub id: &'static str,
}

/// Baseline theme.
pub const BASELINE_THEME: Theme = Theme {
    kind: "local",
    id: "nodebb-theme-persona",
};

/// Baseline extensions followed by `extra`, first occurrence wins.
#[must_use]
pub fn activation_list(extra: &[String]) -> Vec<String> {
    let mut list: Vec<String> = Vec::with_capacity(BASELINE_EXTENSIONS.len() + extra.len());
    let candidates = BASELINE_EXTENSIONS
        .iter()
        .map(|id| (*id).to_string())
        .chain(extra.iter().map(|id| id.trim().to_string()));
    for id in candidates {
        if !id.is_empty() && !list.contains(&id) {
            list.push(id);
        }
    }
    list
}

/// Replaces the active set with `ids`, preserving their order.
pub async fn replace_active(store: &dyn Store, ids: &[String]) -> Result<(), StoreError> {
    store.delete(ACTIVE_EXTENSIONS_KEY).await?;
    let entries: Vec<(i64, String)> = ids
        .iter()
        .enumerate()
        .map(|(index, id)| (score(index), id.clone()))
        .collect();
    store.sorted_set_add(ACTIVE_EXTENSIONS_KEY, &entries).await
}

/// Appends `id` to the active set unless already present.
pub async fn activate(store: &dyn Store, id: &str) -> Result<(), StoreError> {
    let active = active(store).await?;
    if active.iter().any(|existing| existing == id) {
        return Ok(());
    }
    store
        .sorted_set_add(ACTIVE_EXTENSIONS_KEY, &[(score(active.len()), id.to_string())])
        .await
}

/// Active extensions in activation order.
pub async fn active(store: &dyn Store) -> Result<Vec<String>, StoreError> {
    store.sorted_set_range(ACTIVE_EXTENSIONS_KEY).await
}

fn score(index: usize) -> i64 {
    i64::try_from(index).unwrap_or(i64::MAX)
}
