//! Restart representation of a UDQ.

use serde::{Deserialize, Serialize};

use super::enums::{target_type, UdqUpdate, UdqVarType};

/// Values of one well, group or multi-segment well. Wells and groups carry a
/// single `(0, value)` pair; segment UDQs carry `(segment index, value)`
/// with zero-based segment indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RstUdqEntity {
    pub name: String,
    pub values: Vec<(usize, f64)>,
}

impl RstUdqEntity {
    pub fn single(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            values: vec![(0, value)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RstUdq {
    pub name: String,
    #[serde(default)]
    pub unit: String,
    /// DEFINE expression tokens; `None` for ASSIGN quantities.
    #[serde(default)]
    pub definition: Option<Vec<String>>,
    #[serde(default = "default_update")]
    pub update: UdqUpdate,
    #[serde(default)]
    pub scalar: Option<f64>,
    #[serde(default)]
    pub entities: Vec<RstUdqEntity>,
}

fn default_update() -> UdqUpdate {
    UdqUpdate::On
}

impl RstUdq {
    pub fn assigned(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            definition: None,
            update: default_update(),
            scalar: None,
            entities: Vec::new(),
        }
    }

    pub fn defined(name: impl Into<String>, unit: impl Into<String>, definition: Vec<String>, update: UdqUpdate) -> Self {
        Self {
            definition: Some(definition),
            update,
            ..Self::assigned(name, unit)
        }
    }

    pub fn is_define(&self) -> bool {
        self.definition.is_some()
    }

    pub fn var_type(&self) -> UdqVarType {
        target_type(&self.name)
    }
}
