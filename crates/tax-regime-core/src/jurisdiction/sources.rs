//! Raw per-jurisdiction records, exactly as published by each state.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::TaxRegimeError;
use crate::TaxRegimeResult;

const BUNDLED: &str = include_str!("../../data/jurisdictions.json");

/// Read-only collection of raw jurisdiction records keyed by upper-case code.
#[derive(Debug, Clone, Default)]
pub struct JurisdictionSources {
    records: BTreeMap<String, Value>,
}

impl JurisdictionSources {
    /// The 27 state records shipped with the crate.
    pub fn bundled() -> TaxRegimeResult<Self> {
        Self::from_json_str(BUNDLED)
    }

    /// Parse a document shaped either `{ "SP": {...}, ... }` or
    /// `{ "jurisdictions": { "SP": {...}, ... } }`.
    pub fn from_json_str(json: &str) -> TaxRegimeResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> TaxRegimeResult<Self> {
        let root = match value {
            Value::Object(mut map) => match map.remove("jurisdictions") {
                Some(Value::Object(inner)) => inner,
                Some(_) => {
                    return Err(TaxRegimeError::ConfigError(
                        "'jurisdictions' must be an object keyed by code".into(),
                    ))
                }
                None => map,
            },
            _ => {
                return Err(TaxRegimeError::ConfigError(
                    "jurisdiction sources must be a JSON object keyed by code".into(),
                ))
            }
        };

        let records = root
            .into_iter()
            .map(|(code, record)| (normalize_code(&code), record))
            .collect();
        Ok(JurisdictionSources { records })
    }

    pub fn insert(&mut self, code: &str, record: Value) {
        self.records.insert(normalize_code(code), record);
    }

    pub fn get(&self, code: &str) -> Option<&Value> {
        self.records.get(&normalize_code(code))
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
