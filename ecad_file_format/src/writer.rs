use crate::error::{ConvertError, Result};
use std::fs;
use std::path::Path;

/// A fixed-schema output record.
pub trait TargetRecord {
    const HEADER: &'static [&'static str];

    /// Cells in `HEADER` order.
    fn fields(&self) -> Vec<&str>;
}

/// `value` with `decimals` digits after the point, never printed as negative zero.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    let s = format!("{value:.decimals$}");
    match s.strip_prefix('-') {
        Some(magnitude) if magnitude.chars().all(|c| c == '0' || c == '.') => {
            magnitude.to_string()
        }
        _ => s,
    }
}

/// Two decimals. An angle that rounds up to a full turn is printed as 0.00.
pub fn format_rotation(degrees: f64) -> String {
    let s = format_fixed(degrees, 2);
    if s == "360.00" { "0.00".to_string() } else { s }
}

pub fn to_csv_bytes<R: TargetRecord>(records: &[R]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(R::HEADER)?;
    for record in records {
        writer.write_record(record.fields())?;
    }
    writer
        .into_inner()
        .map_err(|e| ConvertError::Io(e.into_error()))
}

/// Serialize and write in one go, replacing whatever is at `path`.
pub fn write_records<R: TargetRecord>(path: &Path, records: &[R]) -> Result<()> {
    let bytes = to_csv_bytes(records)?;
    fs::write(path, bytes)?;
    Ok(())
}
