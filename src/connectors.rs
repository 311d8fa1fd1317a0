//! Connector-type column naming and per-point connector counts.

use std::sync::LazyLock;

/// Connector titles that get their own column, in column order.
pub const CONNECTION_TITLES: [&str; 28] = [
    "Type 2 (Socket Only)",
    "BS1363 3 Pin 13 Amp",
    "CHAdeMO",
    "Type 1 (J1772)",
    "Tesla (Roadster)",
    "Blue Commando (2P+E)",
    "Type 2 (Tethered Connector)",
    "CCS (Type 2)",
    "Tesla (Model S/X)",
    "Tesla Supercharger",
    "Europlug 2-Pin (CEE 7/16)",
    "SCAME Type 3C (Schneider-Legrand)",
    "CEE 7/5",
    "CEE 7/4 - Schuko - Type F",
    "NEMA 5-20R",
    "CEE 3 Pin",
    "CEE 5 Pin",
    "T13 - SEC1011 ( Swiss domestic 3-pin ) - Type J",
    "Avcon Connector",
    "SCAME Type 3A (Low Power)",
    "Type I (AS 3112)",
    "CCS (Type 1)",
    "Wireless Charging",
    "IEC 60309 5-pin",
    "CEE+ 7 Pin",
    "IEC 60309 3-pin",
    "XLR Plug (4 pin)",
    "Three Phase 5-Pin (AS/NZ 3123)",
];

/// Title the source uses when the connector type is not known.
pub const UNKNOWN_TITLE: &str = "Unknown";

const FIELD_PREFIX: &str = "num_connections_";

/// Column collecting connectors whose title is not in [`CONNECTION_TITLES`].
pub const OTHER_FIELD: &str = "num_connections_other";

static ZEROED: LazyLock<ConnectorCounts> = LazyLock::new(|| ConnectorCounts {
    buckets: CONNECTION_TITLES
        .iter()
        .map(|title| (connection_field_name(title), 0))
        .collect(),
    other: 0,
});

/// Turns a connector title into its column name, e.g.
/// `"CEE 7/4 - Schuko - Type F"` becomes `num_connections_cee_7/4_schuko_type_f`.
pub fn connection_field_name(title: &str) -> String {
    let stripped = title.replace(['(', ')'], "");
    let lowered = stripped.to_lowercase();
    let tokens = lowered
        .split_whitespace()
        .filter(|token| *token != "-")
        .collect::<Vec<_>>();
    format!("{FIELD_PREFIX}{}", tokens.join("_"))
}

/// All connector columns in output order, ending with [`OTHER_FIELD`].
pub fn connection_field_names() -> Vec<String> {
    ZEROED
        .buckets
        .iter()
        .map(|(field, _)| field.clone())
        .chain(std::iter::once(OTHER_FIELD.to_string()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorCounts {
    buckets: Vec<(String, u32)>,
    other: u32,
}

impl ConnectorCounts {
    /// A fresh copy of the all-zero counts.
    pub fn zeroed() -> Self {
        ZEROED.clone()
    }

    /// Counts one connector. Returns false when the title was skipped.
    pub fn record(&mut self, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() || title == UNKNOWN_TITLE {
            return false;
        }
        let field = connection_field_name(title);
        match self.buckets.iter_mut().find(|(name, _)| *name == field) {
            Some((_, count)) => *count += 1,
            None => {
                tracing::debug!(title, "connector title has no dedicated column");
                self.other += 1;
            }
        }
        true
    }

    pub fn get(&self, field: &str) -> Option<u32> {
        if field == OTHER_FIELD {
            return Some(self.other);
        }
        self.buckets
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, count)| *count)
    }

    pub fn total(&self) -> u32 {
        self.buckets.iter().map(|(_, count)| count).sum::<u32>() + self.other
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.buckets
            .iter()
            .map(|(field, count)| (field.as_str(), *count))
            .chain(std::iter::once((OTHER_FIELD, self.other)))
    }
}
