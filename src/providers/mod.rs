//! Per-source pipelines: parse the unpacked dump, normalize every point into
//! a flat [`Row`](crate::domain::Row) and export it as CSV.

use std::path::Path;

use serde::Serialize;

use crate::domain::Source;
use crate::error::ChargeError;

pub mod ireland;
pub mod openchargemap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub lines_read: usize,
    pub rows_written: usize,
    pub skipped_lines: usize,
}

/// Converts the unpacked dataset at `input` into a CSV file at `output`.
pub fn run(source: Source, input: &Path, output: &Path) -> Result<PipelineStats, ChargeError> {
    match source {
        Source::Ireland => ireland::run(input, output),
        Source::OpenChargeMap => openchargemap::run(input, output),
    }
}
