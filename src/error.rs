use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ChargeError {
    #[error("unknown dataset source: {0}")]
    UnknownSource(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("download failed: {0}")]
    Http(String),

    #[error("server returned status {status} for {url}: {message}")]
    HttpStatus {
        url: String,
        status: u16,
        message: String,
    },

    #[error("failed to unpack archive: {0}")]
    Archive(String),

    #[error("unsupported archive type: {0}")]
    UnsupportedArchive(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("malformed JSON on line {line}: {message}")]
    #[diagnostic(help("the dataset dump is expected to hold one JSON object per line"))]
    JsonLine { line: usize, message: String },

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("{file}: line {line} has {found} fields but the header has {expected}")]
    #[diagnostic(help("every record must fit within the file's header"))]
    RaggedRecord {
        file: String,
        line: u64,
        found: usize,
        expected: usize,
    },

    #[error("row contains field `{field}` which is not in the declared header")]
    UnexpectedField { field: String },
}

impl From<csv::Error> for ChargeError {
    fn from(err: csv::Error) -> Self {
        ChargeError::Csv(err.to_string())
    }
}
