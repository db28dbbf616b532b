//! Pre-parsed deck keywords.
//!
//! The core never tokenizes deck text. A keyword arrives with its records
//! already split into items, quoting resolved.

use serde::{Deserialize, Serialize};

use crate::error::{KeywordLocation, ScheduleError};

pub type DeckRecord = Vec<String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckKeyword {
    pub name: String,
    #[serde(default)]
    pub records: Vec<DeckRecord>,
    #[serde(default)]
    pub location: KeywordLocation,
}

impl DeckKeyword {
    pub fn new(name: impl Into<String>, records: Vec<DeckRecord>) -> Self {
        let name = name.into();
        let location = KeywordLocation::new(name.clone(), "<inline>", 0);
        Self {
            name,
            records,
            location,
        }
    }

    pub fn with_location(mut self, location: KeywordLocation) -> Self {
        self.location = location;
        self
    }

    /// Item `index` of `record`, treating `*` and empty strings as defaulted.
    pub fn item<'a>(&self, record: &'a DeckRecord, index: usize) -> Option<&'a str> {
        record
            .get(index)
            .map(String::as_str)
            .filter(|item| !item.is_empty() && *item != "*")
    }

    pub fn required_item<'a>(
        &self,
        record: &'a DeckRecord,
        index: usize,
    ) -> Result<&'a str, ScheduleError> {
        record
            .get(index)
            .map(String::as_str)
            .filter(|item| !item.is_empty() && *item != "*")
            .ok_or_else(|| ScheduleError::MissingItem {
                keyword: self.name.clone(),
                item: index + 1,
                location: self.location.clone(),
            })
    }

    pub fn parse_item<T: std::str::FromStr>(
        &self,
        record: &DeckRecord,
        index: usize,
    ) -> Result<Option<T>, ScheduleError> {
        match self.item(record, index) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| ScheduleError::InvalidItem {
                    keyword: self.name.clone(),
                    value: raw.to_string(),
                    location: self.location.clone(),
                }),
        }
    }

    /// Deck text for this keyword: the name, one line per record, and the
    /// closing slash.
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.records.len() + 2);
        lines.push(self.name.clone());
        for record in &self.records {
            let items: Vec<String> = record.iter().map(|item| quote_item(item)).collect();
            lines.push(format!("{} /", items.join(" ")));
        }
        lines.push("/".to_string());
        lines
    }
}

fn quote_item(item: &str) -> String {
    let numeric = item.parse::<f64>().is_ok();
    if numeric || item == "*" || item.is_empty() {
        item.to_string()
    } else {
        format!("'{item}'")
    }
}
