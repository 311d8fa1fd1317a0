use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChargeError;

/// A dataset the tool knows how to download and normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Ireland,
    OpenChargeMap,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::Ireland, Source::OpenChargeMap];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Ireland => "ireland",
            Source::OpenChargeMap => "openchargemap",
        }
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            Source::Ireland => "http://www.cpinfo.ie/data/201907a.zip",
            Source::OpenChargeMap => {
                "https://github.com/openchargemap/ocm-data/blob/master/poi.json.gz?raw=true"
            }
        }
    }

    /// File name the downloaded archive is saved under inside the target directory.
    pub fn archive_name(&self) -> &'static str {
        match self {
            Source::Ireland => "dataset.zip",
            Source::OpenChargeMap => "poi.json.gz",
        }
    }

    /// File the archive unpacks into.
    pub fn dataset_name(&self) -> &'static str {
        match self {
            Source::Ireland => "201907a.txt",
            Source::OpenChargeMap => "poi.json",
        }
    }

    pub fn export_name(&self) -> String {
        format!("{}.csv", self.as_str())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Source {
    type Err = ChargeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "ireland" => Ok(Source::Ireland),
            "openchargemap" | "ocm" => Ok(Source::OpenChargeMap),
            _ => Err(ChargeError::UnknownSource(value.to_string())),
        }
    }
}

/// One exported CSV record: field name to cell text. Fields that are absent
/// are written as empty cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: HashMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.cells.insert(field.into(), value.into());
    }

    /// Inserts the value, or an empty cell for `None`.
    pub fn insert_opt<V: ToString>(&mut self, field: impl Into<String>, value: Option<V>) {
        let text = value.map(|value| value.to_string()).unwrap_or_default();
        self.cells.insert(field.into(), text);
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.cells.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            cells: iter
                .into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        }
    }
}
