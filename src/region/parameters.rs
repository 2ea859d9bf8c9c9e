//! Region-scoped parameters.
//!
//! A region sees its own values first and falls back to values inherited
//! from its device (device-level or global). Parameter names live in the
//! same dependency graph as model names, so setting one invalidates the
//! models that read it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Number(f64),
    Text(String),
}

impl ParameterValue {
    /// Numeric value; text that parses as a number also qualifies.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParameterValue::Number(v) => Some(*v),
            ParameterValue::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Number(v) => write!(f, "{v}"),
            ParameterValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(v: f64) -> Self {
        ParameterValue::Number(v)
    }
}

impl From<&str> for ParameterValue {
    fn from(s: &str) -> Self {
        ParameterValue::Text(s.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(s: String) -> Self {
        ParameterValue::Text(s)
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct Parameters {
    local: BTreeMap<String, ParameterValue>,
    inherited: BTreeMap<String, ParameterValue>,
}

impl Parameters {
    pub(crate) fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.local.get(name).or_else(|| self.inherited.get(name))
    }

    pub(crate) fn set_local(&mut self, name: &str, value: ParameterValue) {
        self.local.insert(name.to_string(), value);
    }

    pub(crate) fn set_inherited(&mut self, name: &str, value: ParameterValue) {
        self.inherited.insert(name.to_string(), value);
    }

    pub(crate) fn remove_local(&mut self, name: &str) -> Option<ParameterValue> {
        self.local.remove(name)
    }
}

/// Parameters for a whole device, loadable from configuration.
///
/// ```json
/// { "global": { "raxis_zero": 0.0 },
///   "regions": { "bulk": { "raxis_variable": "x" } } }
/// ```
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    #[serde(default)]
    pub global: BTreeMap<String, ParameterValue>,
    #[serde(default)]
    pub regions: BTreeMap<String, BTreeMap<String, ParameterValue>>,
}
