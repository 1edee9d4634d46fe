use crate::error::{ConvertError, Result};
use encoding_rs::Encoding;
use log::debug;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Read the whole file, guessing its encoding. A byte order mark, if any, is removed.
pub fn read_with_unknown_encoding(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConvertError::MissingFile(path.to_path_buf()),
        _ => ConvertError::Io(e),
    })?;
    let size = file.metadata().map(|m| m.len() as usize).ok();
    let mut buf = Vec::new();
    buf.try_reserve_exact(size.unwrap_or(0))
        .map_err(|e| ConvertError::Io(std::io::Error::new(ErrorKind::OutOfMemory, e)))?;
    file.read_to_end(&mut buf)?;

    // a byte order mark wins over the guess
    let encoding: &'static Encoding = match Encoding::for_bom(&buf) {
        Some((encoding, _)) => encoding,
        None => {
            let mut detector = chardetng::EncodingDetector::new();
            detector.feed(&buf, true);
            detector.guess(None, true)
        }
    };
    let (text, used, had_errors) = encoding.decode(&buf);
    debug!("{}: decoded as {}", path.display(), used.name());
    if had_errors {
        return Err(ConvertError::Encoding(path.to_path_buf()));
    }
    Ok(text.trim_start_matches('\u{feff}').to_string())
}
