//! Wells and groups as far as the schedule tracks them.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::udq::{UdaControl, UdaValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WellStatus {
    Open,
    Stop,
    Shut,
    Auto,
}

impl FromStr for WellStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(WellStatus::Open),
            "STOP" => Ok(WellStatus::Stop),
            "SHUT" => Ok(WellStatus::Shut),
            "AUTO" => Ok(WellStatus::Auto),
            other => Err(other.to_string()),
        }
    }
}

/// WCONPROD limits. Any limit may be a UDQ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellProduction {
    pub mode: String,
    pub limits: Vec<(UdaControl, UdaValue)>,
}

impl WellProduction {
    /// Item order of the WCONPROD record after the control mode.
    pub const LIMIT_ITEMS: [&'static str; 7] = ["ORAT", "WRAT", "GRAT", "LRAT", "RESV", "BHP", "THP"];

    pub fn limit(&self, control: UdaControl) -> Option<&UdaValue> {
        self.limits
            .iter()
            .find(|(c, _)| *c == control)
            .map(|(_, value)| value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Well {
    pub name: String,
    pub group: String,
    pub head: (usize, usize),
    pub ref_depth: Option<f64>,
    pub phase: String,
    pub status: WellStatus,
    pub productivity_index: Option<f64>,
    pub production: Option<WellProduction>,
    pub insert_index: usize,
}

impl Well {
    pub fn new(name: impl Into<String>, group: impl Into<String>, insert_index: usize) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            head: (0, 0),
            ref_depth: None,
            phase: "OIL".to_string(),
            status: WellStatus::Shut,
            productivity_index: None,
            production: None,
            insert_index,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == WellStatus::Open
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    /// `None` only for `FIELD`.
    pub parent: Option<String>,
    pub insert_index: usize,
}

impl Group {
    pub fn field() -> Self {
        Self {
            name: "FIELD".to_string(),
            parent: None,
            insert_index: 0,
        }
    }
}
