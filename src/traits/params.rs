// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::errors::ComputeError;

/// A stage's own parameter set, as loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageParams(BTreeMap<String, serde_yaml::Value>);

impl StageParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_yaml::Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.0.get(key)
    }

    /// Sets a parameter and returns the previous value.
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: impl Into<serde_yaml::Value>,
    ) -> Option<serde_yaml::Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(serde_yaml::Value::as_f64)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(serde_yaml::Value::as_u64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(serde_yaml::Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(serde_yaml::Value::as_bool)
    }

    /// A required numeric parameter.
    pub fn require_f64(&self, key: &str) -> Result<f64, ComputeError> {
        self.get_f64(key)
            .ok_or_else(|| ComputeError::InvalidInput(format!("parameter '{}' must be a number", key)))
    }

    /// A required string parameter.
    pub fn require_str(&self, key: &str) -> Result<&str, ComputeError> {
        self.get_str(key)
            .ok_or_else(|| ComputeError::InvalidInput(format!("parameter '{}' must be a string", key)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_yaml::Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<String, serde_yaml::Value>> for StageParams {
    fn from(map: HashMap<String, serde_yaml::Value>) -> Self {
        Self(map.into_iter().collect())
    }
}
