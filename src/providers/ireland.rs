//! Charge point status dump for the Republic of Ireland.
//!
//! Each line holds nine tab-separated fields:
//! date (yyyymmdd), time (hhmm), charge point id, charge point type
//! (StandardType2, CHAdeMO, CCS, FastAC), status (OOS, OOC, Part, Occ,
//! Unknown), coordinates, address, longitude, latitude.
//!
//! Lines are ordered oldest to newest and the same charge point appears once
//! per snapshot, so the last line seen for an id is its current state.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::dedup::LatestById;
use crate::domain::Row;
use crate::error::ChargeError;
use crate::export;
use crate::providers::PipelineStats;

pub const FIELD_NAMES: [&str; 6] = [
    "charge_point_id",
    "charge_point_type",
    "status",
    "address",
    "longitude",
    "latitude",
];

pub fn field_names() -> Vec<String> {
    FIELD_NAMES.iter().map(|field| field.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargePointStatus {
    pub charge_point_id: String,
    pub charge_point_type: String,
    pub status: String,
    pub address: String,
    pub longitude: String,
    pub latitude: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: expected 9 tab-separated fields, found {found}: {content:?}")]
pub struct MalformedLine {
    pub line: usize,
    pub found: usize,
    pub content: String,
}

impl From<ChargePointStatus> for Row {
    fn from(point: ChargePointStatus) -> Self {
        Row::from_iter([
            ("charge_point_id", point.charge_point_id),
            ("charge_point_type", point.charge_point_type),
            ("status", point.status),
            ("address", point.address),
            ("longitude", point.longitude),
            ("latitude", point.latitude),
        ])
    }
}

/// Parses one raw line; `line` is the 1-based line number used in errors.
pub fn parse_line(line: usize, raw: &str) -> Result<ChargePointStatus, MalformedLine> {
    let trimmed = raw.trim();
    let fields = trimmed.split('\t').collect::<Vec<_>>();
    let [
        _date,
        _time,
        charge_point_id,
        charge_point_type,
        status,
        _coordinates,
        address,
        longitude,
        latitude,
    ] = fields.as_slice()
    else {
        return Err(MalformedLine {
            line,
            found: fields.len(),
            content: trimmed.to_string(),
        });
    };

    Ok(ChargePointStatus {
        charge_point_id: charge_point_id.to_string(),
        charge_point_type: charge_point_type.to_string(),
        status: status.to_string(),
        address: address.to_string(),
        longitude: longitude.to_string(),
        latitude: latitude.to_string(),
    })
}

/// Splits `reader` into lines, replacing invalid UTF-8 with U+FFFD. The dump
/// is not consistently encoded.
pub fn lossy_lines<R: BufRead>(reader: R) -> impl Iterator<Item = Result<String, ChargeError>> {
    reader.split(b'\n').map(|bytes| {
        bytes
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .map_err(|err| ChargeError::Filesystem(err.to_string()))
    })
}

#[derive(Debug, Default)]
pub struct LatestStatuses {
    pub points: LatestById<ChargePointStatus>,
    pub lines_read: usize,
    pub skipped_lines: usize,
}

/// Reads every line and keeps the latest status per charge point. Malformed
/// lines are logged and skipped.
pub fn collect_latest<R: BufRead>(reader: R) -> Result<LatestStatuses, ChargeError> {
    let mut collected = LatestStatuses::default();
    for (index, raw) in lossy_lines(reader).enumerate() {
        let raw = raw?;
        collected.lines_read += 1;
        match parse_line(index + 1, &raw) {
            Ok(point) => {
                let id = point.charge_point_id.clone();
                collected.points.insert(id, point);
            }
            Err(err) => {
                tracing::warn!(%err, "skipping malformed line");
                collected.skipped_lines += 1;
            }
        }
    }
    Ok(collected)
}

pub fn run(input: &Path, output: &Path) -> Result<PipelineStats, ChargeError> {
    let file = File::open(input)
        .map_err(|err| ChargeError::Filesystem(format!("open {}: {err}", input.display())))?;
    let collected = collect_latest(BufReader::new(file))?;
    tracing::info!(
        lines = collected.lines_read,
        charge_points = collected.points.len(),
        skipped = collected.skipped_lines,
        "collected latest charge point statuses"
    );

    let rows = collected
        .points
        .into_values()
        .into_iter()
        .map(|point| Ok(Row::from(point)));
    let rows_written = export::export_csv(output, &FIELD_NAMES, rows)?;

    Ok(PipelineStats {
        lines_read: collected.lines_read,
        rows_written,
        skipped_lines: collected.skipped_lines,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const LINE_A: &str =
        "20190701\t0005\tIE-101\tCHAdeMO\tPart\t53.1,-6.2\tMain St, Naas\t-6.2\t53.1\r\n";

    #[test]
    fn parse_line_projects_six_fields() {
        let point = parse_line(1, LINE_A).unwrap();
        assert_eq!(
            point,
            ChargePointStatus {
                charge_point_id: "IE-101".to_string(),
                charge_point_type: "CHAdeMO".to_string(),
                status: "Part".to_string(),
                address: "Main St, Naas".to_string(),
                longitude: "-6.2".to_string(),
                latitude: "53.1".to_string(),
            }
        );
    }

    #[test]
    fn wrong_field_count_is_malformed() {
        let err = parse_line(7, "20190701\t0005\tIE-101\tCHAdeMO").unwrap_err();
        assert_matches!(err, MalformedLine { line: 7, found: 4, .. });
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let bytes: &[u8] = b"20190701\t0005\tIE-7\tCCS\tOcc\tx\tCaf\xe9 Road\t-6\t53\n";
        let lines = lossy_lines(bytes).collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(lines.len(), 1);
        let point = parse_line(1, &lines[0]).unwrap();
        assert_eq!(point.address, "Caf\u{FFFD} Road");
    }

    #[test]
    fn later_line_replaces_earlier_status() {
        let input = "\
20190701\t0005\tIE-1\tCCS\tPart\tc\tA\t-6.1\t53.1
20190701\t0005\tIE-2\tFastAC\tOcc\tc\tB\t-6.2\t53.2
broken line
20190701\t0010\tIE-1\tCCS\tOOS\tc\tA\t-6.1\t53.1
";
        let collected = collect_latest(input.as_bytes()).unwrap();
        assert_eq!(collected.lines_read, 4);
        assert_eq!(collected.skipped_lines, 1);
        assert_eq!(collected.points.len(), 2);
        assert_eq!(collected.points.get("IE-1").unwrap().status, "OOS");
        assert_eq!(collected.points.get("IE-2").unwrap().status, "Occ");
    }
}
