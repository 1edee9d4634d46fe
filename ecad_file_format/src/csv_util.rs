use crate::error::{ConvertError, Result};
use crate::format::{Artifact, DetectError, Detected, EcadFamily, Field, detect_format};
use crate::text_util::read_with_unknown_encoding;
use csv::StringRecord;
use log::debug;
use std::path::{Path, PathBuf};

/// Rows above the header that are tolerated (title lines, export date, units note ...).
pub const MAX_PREAMBLE_ROWS: usize = 32;

/// Most frequent of `,` TAB `;` outside of quoted fields, over the lines the header may be
/// on. Quote state does not carry over a line end. Comma on a tie.
pub fn determine_separator(text: &str) -> u8 {
    let mut counts: [(usize, u8); 3] = [(0, b';'), (0, b'\t'), (0, b',')];
    let lines = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(MAX_PREAMBLE_ROWS);
    for line in lines {
        let mut quoted = false;
        for b in line.bytes() {
            match b {
                b'"' => quoted = !quoted,
                _ if quoted => {}
                b';' => counts[0].0 += 1,
                b'\t' => counts[1].0 += 1,
                b',' => counts[2].0 += 1,
                _ => {}
            }
        }
    }
    counts.sort_by(|a, b| a.0.cmp(&b.0));
    counts[2].1
}

/// One data line of the source file.
#[derive(Debug, Clone)]
pub struct SourceRow {
    /// 1-based line number in the source file.
    pub line: usize,
    pub record: StringRecord,
}

impl SourceRow {
    pub fn cell(&self, idx: usize) -> &str {
        self.record.get(idx).unwrap_or("").trim().trim_matches('"').trim()
    }

    pub fn is_blank(&self) -> bool {
        self.record.iter().all(|c| c.trim().trim_matches('"').trim().is_empty())
    }
}

/// A whole input file, header located and variant detected.
#[derive(Debug)]
pub struct SourceTable {
    pub path: PathBuf,
    pub header: Vec<String>,
    pub detected: Detected<'static>,
    pub rows: Vec<SourceRow>,
}

impl SourceTable {
    /// First non-empty cell among the columns mapped to `field`.
    pub fn value<'r>(&self, row: &'r SourceRow, field: Field) -> Option<&'r str> {
        self.detected
            .columns
            .columns(field)
            .iter()
            .map(|idx| row.cell(*idx))
            .find(|c| !c.is_empty())
    }

    pub fn required<'r>(&self, row: &'r SourceRow, field: Field) -> Result<&'r str> {
        self.value(row, field)
            .ok_or_else(|| self.malformed(row, field, "required value is empty"))
    }

    pub fn malformed(&self, row: &SourceRow, field: Field, reason: impl Into<String>) -> ConvertError {
        ConvertError::MalformedRow {
            path: self.path.clone(),
            row: row.line,
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Every mapped field of the row is empty.
    pub fn is_unmapped_blank(&self, row: &SourceRow) -> bool {
        self.detected.columns.fields().all(|f| self.value(row, f).is_none())
    }
}

/// Read `path` fully, find its header row and detect which variant of `family` it is.
pub fn load_table(path: &Path, family: EcadFamily, artifact: Artifact) -> Result<SourceTable> {
    let text = read_with_unknown_encoding(path)?;
    let separator = determine_separator(&text);
    let reader = csv::ReaderBuilder::new()
        .delimiter(separator)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.into_records() {
        let record = record?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        rows.push(SourceRow { line, record });
    }

    let (header_idx, detected) = find_header_row(path, &rows, family, artifact)?;
    let header = rows[header_idx]
        .record
        .iter()
        .map(|s| s.trim().to_string())
        .collect();
    debug!(
        "{}: {} header on line {}, variant {}, separator {:?}",
        path.display(),
        artifact,
        rows[header_idx].line,
        detected.variant.id,
        separator as char
    );
    let rows = rows.split_off(header_idx + 1);
    Ok(SourceTable {
        path: path.to_path_buf(),
        header,
        detected,
        rows,
    })
}

/// Index of the first row that is a header of a known variant.
/// Empty rows are discarded and not counted towards the preamble limit.
pub fn find_header_row(
    path: &Path,
    rows: &[SourceRow],
    family: EcadFamily,
    artifact: Artifact,
) -> Result<(usize, Detected<'static>)> {
    let mut first_columns: Option<Vec<String>> = None;
    let candidates = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.is_blank())
        .take(MAX_PREAMBLE_ROWS);
    for (idx, row) in candidates {
        let columns = row
            .record
            .iter()
            .map(|s| s.trim().to_string())
            .collect::<Vec<_>>();
        match detect_format(family, artifact, &columns) {
            Ok(detected) => return Ok((idx, detected)),
            Err(DetectError::Ambiguous(ids)) => {
                return Err(ConvertError::AmbiguousFormat {
                    path: path.to_path_buf(),
                    candidates: ids.into_iter().map(String::from).collect(),
                });
            }
            Err(DetectError::Unrecognized) => {
                first_columns.get_or_insert(columns);
            }
        }
    }
    Err(ConvertError::UnrecognizedFormat {
        path: path.to_path_buf(),
        columns: first_columns.unwrap_or_default(),
    })
}
