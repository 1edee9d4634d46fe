use crate::designator::Designator;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConvertError>;

/// Fatal conditions. Any of these aborts the artifact being converted, nothing is written for it.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("{}: unrecognized format, no known header among columns [{}]", .path.display(), .columns.join(", "))]
    UnrecognizedFormat { path: PathBuf, columns: Vec<String> },

    #[error("{}: ambiguous format, header matches {} equally well", .path.display(), .candidates.join(" and "))]
    AmbiguousFormat {
        path: PathBuf,
        candidates: Vec<String>,
    },

    #[error("{}:{row}: malformed row, field '{field}': {reason}", .path.display())]
    MalformedRow {
        path: PathBuf,
        /// 1-based line number in the source file.
        row: usize,
        field: String,
        reason: String,
    },

    #[error("duplicate designator {designator}: present in {first} and in {second}")]
    DuplicateDesignator {
        designator: Designator,
        first: String,
        second: String,
    },

    #[error("input file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("missing required flag: {0}")]
    MissingRequiredFlag(String),

    #[error("{}: cannot decode text", .0.display())]
    Encoding(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ConvertError {
    /// Errors caused by how the tool was invoked rather than by file contents.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            ConvertError::MissingFile(_) | ConvertError::MissingRequiredFlag(_)
        )
    }
}

/// Non-fatal conditions, reported alongside a successful conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Warning {
    #[error("{}: counterpart file {} not found, converting this file alone", .given.display(), .expected.display())]
    CounterpartFileMissing { given: PathBuf, expected: PathBuf },

    #[error("{}:{row}: {designator} says side '{stated}' but the file holds {side} components", .path.display())]
    SideOverridden {
        path: PathBuf,
        row: usize,
        designator: Designator,
        stated: String,
        side: crate::pnp::Side,
    },

    #[error("{designators}: conflicting {field} '{kept}' and '{dropped}', keeping '{kept}'")]
    ConflictingPartNumber {
        designators: String,
        field: String,
        kept: String,
        dropped: String,
    },
}
