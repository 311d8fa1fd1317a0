use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use csv::Writer;

use crate::domain::Row;
use crate::error::ChargeError;

/// Writes `rows` under the header `fields` to a new CSV file at `path` and
/// returns the number of rows written.
///
/// Rows are pulled one at a time, so a lazily produced sequence is never held
/// in memory. The first `Err` in `rows` aborts the export.
pub fn export_csv<I, S>(path: &Path, fields: &[S], rows: I) -> Result<usize, ChargeError>
where
    I: IntoIterator<Item = Result<Row, ChargeError>>,
    S: AsRef<str>,
{
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| ChargeError::Filesystem(err.to_string()))?;
    }
    let file = File::create(path).map_err(|err| {
        ChargeError::Filesystem(format!("create {}: {err}", path.display()))
    })?;
    write_rows(file, fields, rows)
}

/// Same as [`export_csv`] but for any writer.
pub fn write_rows<W, I, S>(writer: W, fields: &[S], rows: I) -> Result<usize, ChargeError>
where
    W: Write,
    I: IntoIterator<Item = Result<Row, ChargeError>>,
    S: AsRef<str>,
{
    let fields = fields.iter().map(AsRef::as_ref).collect::<Vec<&str>>();
    let declared = fields.iter().copied().collect::<HashSet<&str>>();

    let mut csv_writer = Writer::from_writer(writer);
    csv_writer.write_record(&fields)?;

    let mut written = 0usize;
    for row in rows {
        let row = row?;
        if let Some(field) = row.fields().find(|field| !declared.contains(field)) {
            return Err(ChargeError::UnexpectedField {
                field: field.to_string(),
            });
        }
        csv_writer.write_record(fields.iter().map(|field| row.get(field).unwrap_or("")))?;
        written += 1;
    }
    csv_writer
        .flush()
        .map_err(|err| ChargeError::Filesystem(err.to_string()))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn render(fields: &[&str], rows: Vec<Row>) -> Result<String, ChargeError> {
        let mut buffer = Vec::new();
        write_rows(&mut buffer, fields, rows.into_iter().map(Ok))?;
        Ok(String::from_utf8(buffer).unwrap())
    }

    #[test]
    fn absent_fields_are_written_empty() {
        let rows = vec![
            Row::from_iter([("a", "1"), ("b", "2")]),
            Row::from_iter([("b", "3")]),
        ];
        let text = render(&["a", "b"], rows).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["a,b", "1,2", ",3"]);
    }

    #[test]
    fn header_is_written_without_rows() {
        let text = render(&["uuid", "country"], Vec::new()).unwrap();
        assert_eq!(text.trim_end(), "uuid,country");
    }

    #[test]
    fn undeclared_field_is_rejected() {
        let rows = vec![Row::from_iter([("a", "1"), ("z", "2")])];
        let err = render(&["a"], rows).unwrap_err();
        assert_matches!(err, ChargeError::UnexpectedField { field } if field == "z");
    }

    #[test]
    fn values_needing_quotes_are_quoted() {
        let rows = vec![Row::from_iter([("address", "Main St, Dublin")])];
        let text = render(&["address"], rows).unwrap();
        assert!(text.contains("\"Main St, Dublin\""));
    }

    #[test]
    fn stops_at_first_failed_row() {
        let rows: Vec<Result<Row, ChargeError>> = vec![
            Ok(Row::from_iter([("a", "1")])),
            Err(ChargeError::JsonLine {
                line: 2,
                message: "eof".to_string(),
            }),
            Ok(Row::from_iter([("a", "3")])),
        ];
        let err = write_rows(Vec::new(), &["a"], rows).unwrap_err();
        assert_matches!(err, ChargeError::JsonLine { line: 2, .. });
    }
}
