// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed extension map standing in for dynamic attribute attachment
//! (`m.ssh`, `m.container`, `m.ram`). Backend state is stored as JSON so a
//! machine blob stays one flat serializable document; typed accessors hide
//! the JSON at the call site.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("no extension registered under {0:?}")]
    Missing(String),
    #[error("extension {0:?} failed to deserialize as the requested type: {1}")]
    Mismatch(String, serde_json::Error),
    #[error("failed to serialize extension {0:?}: {1}")]
    Serialize(String, serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, serde::Deserialize)]
pub struct ExtensionMap {
    values: BTreeMap<String, Value>,
}

impl ExtensionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), ExtensionError> {
        let json = serde_json::to_value(value)
            .map_err(|e| ExtensionError::Serialize(key.to_string(), e))?;
        self.values.insert(key.to_string(), json);
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, ExtensionError> {
        let raw = self
            .values
            .get(key)
            .ok_or_else(|| ExtensionError::Missing(key.to_string()))?;
        serde_json::from_value(raw.clone())
            .map_err(|e| ExtensionError::Mismatch(key.to_string(), e))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Apply a dotted-path assignment like `ram.size = "2G"`: the first
    /// segment names the extension, the rest is a JSON-pointer-style path
    /// within it. Used for `.ram.size=2G` style hook actions.
    pub fn assign_path(&mut self, path: &str, value: &str) -> Result<(), ExtensionError> {
        let mut segments = path.splitn(2, '.');
        let key = segments
            .next()
            .ok_or_else(|| ExtensionError::Missing(path.to_string()))?;
        let rest = segments.next();

        let mut entry = self.values.remove(key).unwrap_or_else(|| Value::Object(Default::default()));
        match rest {
            None => entry = Value::String(value.to_string()),
            Some(field) => {
                if let Value::Object(map) = &mut entry {
                    map.insert(field.to_string(), Value::String(value.to_string()));
                } else {
                    entry = serde_json::json!({ field: value });
                }
            }
        }
        self.values.insert(key.to_string(), entry);
        Ok(())
    }
}

#[cfg(test)]
#[path = "extensions_tests.rs"]
mod tests;
