//! Engine configuration: per-class selector overrides.

use log::debug;
use serde_json::Value;
use std::collections::HashMap;

/// How a class's built-in selector set is adjusted at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorOverride {
    /// Replace the class's selector set entirely.
    Replace(Vec<String>),
    /// Keep the built-in set, prefixing every entry (e.g. to scope the whole
    /// class under a container selector).
    Prefix(String),
}

/// Construction-time configuration for [`crate::StyleEngine`].
#[derive(Clone, Debug, Default)]
pub struct StyleConfig {
    /// Per-class selector overrides; classes absent here keep their built-in
    /// selector sets.
    pub selectors: HashMap<String, SelectorOverride>,
}

impl StyleConfig {
    /// Read overrides from the loosely-shaped JSON form:
    ///
    /// ```json
    /// { "selectors": { "heading": [".custom-h"], "body": { "prefix": ".scope " } } }
    /// ```
    ///
    /// Arrays become [`SelectorOverride::Replace`] (non-string entries are
    /// dropped), objects carrying a string `prefix` become
    /// [`SelectorOverride::Prefix`]. Every other shape is ignored without
    /// error, keeping the format forward-compatible.
    pub fn from_json(value: &Value) -> Self {
        let mut config = Self::default();
        let Some(selectors) = value.get("selectors").and_then(Value::as_object) else {
            return config;
        };
        for (name, shape) in selectors {
            match shape {
                Value::Array(entries) => {
                    let list: Vec<String> = entries
                        .iter()
                        .filter_map(|entry| entry.as_str().map(str::to_owned))
                        .collect();
                    config
                        .selectors
                        .insert(name.clone(), SelectorOverride::Replace(list));
                }
                Value::Object(map) => {
                    if let Some(prefix) = map.get("prefix").and_then(Value::as_str) {
                        config
                            .selectors
                            .insert(name.clone(), SelectorOverride::Prefix(prefix.to_owned()));
                    } else {
                        debug!("ignoring selector override for {name:?}: no prefix");
                    }
                }
                _ => {
                    debug!("ignoring selector override for {name:?}: unsupported shape");
                }
            }
        }
        config
    }
}
