// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Scalar render options

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Options keyed by name. The map is ordered, which fixes the canonical order.
pub type RenderOptions = BTreeMap<String, OptionValue>;

/// A single scalar option value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl OptionValue {
    /// Parse a command-line style value: booleans, integers, floats, then text
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed {
            "true" => return OptionValue::Bool(true),
            "false" => return OptionValue::Bool(false),
            _ => {}
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return OptionValue::Int(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return OptionValue::Float(f);
            }
        }
        OptionValue::Text(trimmed.to_string())
    }

    /// Value as OpenSCAD source text, used for `-D` defines
    pub fn to_scad_literal(&self) -> String {
        match self {
            OptionValue::Bool(b) => b.to_string(),
            OptionValue::Int(i) => i.to_string(),
            OptionValue::Float(f) => format!("{}", f),
            OptionValue::Text(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        }
    }

    pub(crate) fn type_tag(&self) -> u8 {
        match self {
            OptionValue::Bool(_) => b'b',
            OptionValue::Int(_) => b'i',
            OptionValue::Float(_) => b'f',
            OptionValue::Text(_) => b's',
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Int(i) => write!(f, "{}", i),
            OptionValue::Float(v) => write!(f, "{}", v),
            OptionValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(value as i64)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

/// Parse `key=value` pairs as given on the command line
pub fn parse_defines<S: AsRef<str>>(defines: &[S]) -> Result<RenderOptions> {
    let mut options = RenderOptions::new();
    for define in defines {
        let define = define.as_ref();
        let Some((key, value)) = define.split_once('=') else {
            bail!("Invalid option '{}', expected key=value", define);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Invalid option '{}', key is empty", define);
        }
        options.insert(key.to_string(), OptionValue::parse(value));
    }
    Ok(options)
}
