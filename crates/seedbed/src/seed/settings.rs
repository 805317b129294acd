use serde_json::{Map, Value};

/// Store hash holding the forum's runtime settings.
pub const SETTINGS_KEY: &str = "config";

/// In-memory mirror of the persisted runtime settings.
///
/// Mutation is limited to the two seeding rules: [`Settings::apply_defaults`]
/// fills absent keys only, [`Settings::force`] always overwrites.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    values: Map<String, Value>,
}

impl Settings {
    /// Reads a setting.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// All settings.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub(crate) fn replace(&mut self, values: Map<String, Value>) {
        self.values = values;
    }

    /// Copies every default whose key is absent or null and returns the keys
    /// that were filled.
    pub(crate) fn apply_defaults(&mut self, defaults: &Map<String, Value>) -> Vec<String> {
        let mut filled = Vec::new();
        for (key, value) in defaults {
            let absent = matches!(self.values.get(key), None | Some(Value::Null));
            if absent {
                self.values.insert(key.clone(), value.clone());
                filled.push(key.clone());
            }
        }
        filled
    }

    pub(crate) fn force(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }
}
