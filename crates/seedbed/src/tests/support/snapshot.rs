//! Observable store state used to compare seeded baselines.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::seed::SETTINGS_KEY;
use crate::seed::extensions;
use crate::store::Store;

const PRIVILEGE_PREFIX: &str = "privileges:global:";

/// Settings, extensions, privileges and key set at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub keys: Vec<String>,
    pub settings: Map<String, Value>,
    pub extensions: Vec<String>,
    pub privileges: BTreeMap<String, Vec<String>>,
}

/// Captures the baseline-relevant state of `store`.
pub async fn snapshot(store: &dyn Store) -> Snapshot {
    let mut keys = store.keys().await.expect("keys should list");
    keys.sort();
    let settings = store
        .get_object(SETTINGS_KEY)
        .await
        .expect("settings should read")
        .unwrap_or_default();
    let extensions = extensions::active(store)
        .await
        .expect("extensions should read");
    let mut privileges = BTreeMap::new();
    for key in keys.iter().filter(|key| key.starts_with(PRIVILEGE_PREFIX)) {
        let members = store.set_members(key).await.expect("privilege set should read");
        privileges.insert(key.clone(), members);
    }
    Snapshot {
        keys,
        settings,
        extensions,
        privileges,
    }
}
