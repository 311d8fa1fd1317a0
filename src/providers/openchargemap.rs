//! Open Charge Map (https://openchargemap.org) database dump.
//!
//! The dump holds one point of interest per line as a JSON object. Only
//! European points are exported; connectors are counted per connector type.
//!
//! Credits go to the Open Charge Map developers, contributors and data
//! providers.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use serde_json::Number;

use crate::connectors::{ConnectorCounts, connection_field_names};
use crate::domain::Row;
use crate::error::ChargeError;
use crate::export;
use crate::providers::PipelineStats;

pub const EUROPE: &str = "EU";

pub const BASE_FIELD_NAMES: [&str; 8] = [
    "uuid",
    "operator_id",
    "usage_type_id",
    "country",
    "address",
    "latitude",
    "longitude",
    "num_points",
];

/// Base columns followed by one count column per connector type.
pub fn field_names() -> Vec<String> {
    BASE_FIELD_NAMES
        .iter()
        .map(|field| field.to_string())
        .chain(connection_field_names())
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PointOfInterest {
    #[serde(rename = "UUID")]
    pub uuid: String,
    #[serde(rename = "OperatorID", default)]
    pub operator_id: Option<Number>,
    #[serde(rename = "UsageTypeID", default)]
    pub usage_type_id: Option<Number>,
    #[serde(rename = "AddressInfo")]
    pub address_info: AddressInfo,
    #[serde(rename = "NumberOfPoints", default)]
    pub number_of_points: Option<Number>,
    #[serde(rename = "Connections", default)]
    pub connections: Option<Vec<Connection>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    pub country: Country,
    #[serde(default)]
    pub latitude: Option<Number>,
    #[serde(default)]
    pub longitude: Option<Number>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Country {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub continent_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Connection {
    #[serde(default)]
    pub connection_type: Option<ConnectionType>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConnectionType {
    #[serde(default)]
    pub title: Option<String>,
}

impl PointOfInterest {
    pub fn is_european(&self) -> bool {
        self.address_info.country.continent_code.as_deref() == Some(EUROPE)
    }

    /// Address parts that are present, joined with `", "`.
    pub fn address(&self) -> String {
        let info = &self.address_info;
        [&info.title, &info.address_line1, &info.address_line2, &info.town]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn connector_counts(&self) -> ConnectorCounts {
        let mut counts = ConnectorCounts::zeroed();
        for connection in self.connections.iter().flatten() {
            let title = connection
                .connection_type
                .as_ref()
                .and_then(|kind| kind.title.as_deref());
            if let Some(title) = title {
                counts.record(title);
            }
        }
        counts
    }

    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("uuid", self.uuid.as_str());
        row.insert_opt("operator_id", self.operator_id.as_ref());
        row.insert_opt("usage_type_id", self.usage_type_id.as_ref());
        row.insert_opt("country", self.address_info.country.title.as_deref());
        row.insert("address", self.address());
        row.insert_opt("latitude", self.address_info.latitude.as_ref());
        row.insert_opt("longitude", self.address_info.longitude.as_ref());
        row.insert_opt("num_points", self.number_of_points.as_ref());
        for (field, count) in self.connector_counts().iter() {
            row.insert(field, count.to_string());
        }
        row
    }
}

/// Parses one dump line; `line` is the 1-based line number used in errors.
pub fn parse_point(line: usize, raw: &str) -> Result<PointOfInterest, ChargeError> {
    serde_json::from_str(raw).map_err(|err| ChargeError::JsonLine {
        line,
        message: err.to_string(),
    })
}

/// Lazily parses, filters and normalizes every line of `reader`, counting
/// the lines pulled in `lines_read`.
///
/// Blank lines are ignored. The first malformed line yields an `Err`, which
/// ends the export.
pub fn european_rows<'a, R: BufRead + 'a>(
    reader: R,
    lines_read: &'a mut usize,
) -> impl Iterator<Item = Result<Row, ChargeError>> + 'a {
    reader
        .lines()
        .inspect(move |_| *lines_read += 1)
        .enumerate()
        .filter(|(_, raw)| raw.as_ref().map_or(true, |text| !text.trim().is_empty()))
        .map(|(index, raw)| {
            let raw = raw.map_err(|err| ChargeError::Filesystem(err.to_string()))?;
            parse_point(index + 1, &raw)
        })
        .filter(|point| point.as_ref().map_or(true, PointOfInterest::is_european))
        .map(|point| point.map(|point| point.to_row()))
}

pub fn run(input: &Path, output: &Path) -> Result<PipelineStats, ChargeError> {
    let file = File::open(input)
        .map_err(|err| ChargeError::Filesystem(format!("open {}: {err}", input.display())))?;
    // The reader stays open until the export has drained the whole chain.
    let mut lines_read = 0usize;
    let rows = european_rows(BufReader::new(file), &mut lines_read);
    let rows_written = export::export_csv(output, &field_names(), rows)?;
    tracing::info!(lines = lines_read, european = rows_written, "exported points");

    Ok(PipelineStats {
        lines_read,
        rows_written,
        skipped_lines: 0,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn point_json(continent: &str, connectors: &[&str]) -> String {
        let connections = connectors
            .iter()
            .map(|title| serde_json::json!({ "ConnectionType": { "Title": title } }))
            .collect::<Vec<_>>();
        serde_json::json!({
            "UUID": format!("uuid-{continent}"),
            "OperatorID": 3,
            "UsageTypeID": null,
            "NumberOfPoints": 2,
            "AddressInfo": {
                "Title": "Car Park",
                "AddressLine1": "1 Quay Street",
                "AddressLine2": null,
                "Town": "Galway",
                "Latitude": 53.2707,
                "Longitude": -9.0568,
                "Country": { "Title": "Ireland", "ContinentCode": continent }
            },
            "Connections": connections
        })
        .to_string()
    }

    #[test]
    fn normalizes_scalars_and_address() {
        let point = parse_point(1, &point_json("EU", &[])).unwrap();
        let row = point.to_row();
        assert_eq!(row.get("uuid"), Some("uuid-EU"));
        assert_eq!(row.get("operator_id"), Some("3"));
        assert_eq!(row.get("usage_type_id"), Some(""));
        assert_eq!(row.get("country"), Some("Ireland"));
        assert_eq!(row.get("address"), Some("Car Park, 1 Quay Street, Galway"));
        assert_eq!(row.get("latitude"), Some("53.2707"));
        assert_eq!(row.get("longitude"), Some("-9.0568"));
        assert_eq!(row.get("num_points"), Some("2"));
    }

    #[test]
    fn every_row_has_the_full_schema() {
        let point = parse_point(1, &point_json("EU", &["CCS (Type 2)"])).unwrap();
        let row = point.to_row();
        let fields = field_names();
        assert_eq!(row.len(), fields.len());
        for field in &fields {
            assert!(row.get(field).is_some(), "{field}");
        }
    }

    #[test]
    fn counts_connectors_and_skips_unknown() {
        let json = point_json("EU", &["CHAdeMO", "Unknown", "CHAdeMO "]);
        let row = parse_point(1, &json).unwrap().to_row();
        assert_eq!(row.get("num_connections_chademo"), Some("2"));
        assert_eq!(row.get("num_connections_other"), Some("0"));
        let total = row
            .fields()
            .filter(|field| field.starts_with("num_connections_"))
            .map(|field| row.get(field).unwrap().parse::<u32>().unwrap())
            .sum::<u32>();
        assert_eq!(total, 2);
    }

    #[test]
    fn missing_connection_type_is_ignored() {
        let json = r#"{"UUID":"x","AddressInfo":{"Country":{"ContinentCode":"EU"}},
            "Connections":[{"ConnectionType":null},{"ConnectionType":{"Title":"Type 1 (J1772)"}}]}"#
            .replace('\n', "");
        let counts = parse_point(1, &json).unwrap().connector_counts();
        assert_eq!(counts.total(), 1);
        assert_eq!(counts.get("num_connections_type_1_j1772"), Some(1));
    }

    #[test]
    fn only_european_points_are_kept() {
        let input = format!(
            "{}\n\n{}\n{}\n",
            point_json("EU", &["CHAdeMO"]),
            point_json("NA", &["CHAdeMO"]),
            point_json("EU", &[])
        );
        let mut lines_read = 0;
        let rows = european_rows(input.as_bytes(), &mut lines_read)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(lines_read, 4);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.get("uuid") == Some("uuid-EU")));
    }

    #[test]
    fn malformed_json_stops_the_stream() {
        let valid = point_json("EU", &[]);
        let input = format!("{valid}\n{{\"UUID\": \n{valid}\n");
        let mut lines_read = 0;
        let mut rows = european_rows(input.as_bytes(), &mut lines_read);
        assert!(rows.next().unwrap().is_ok());
        assert_matches!(rows.next(), Some(Err(ChargeError::JsonLine { line: 2, .. })));
    }
}
