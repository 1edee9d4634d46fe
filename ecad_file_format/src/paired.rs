//! Placement files exported as a top/bottom pair, e.g. `board_front.csv` + `board_back.csv`.

use crate::error::{ConvertError, Result, Warning};
use crate::pnp::Side;
use log::{debug, warn};
use std::path::{Path, PathBuf};

struct SuffixRule {
    suffix: &'static str,
    side: Side,
    /// Tried in order.
    counterparts: &'static [&'static str],
}

const SUFFIX_RULES: &[SuffixRule] = &[
    SuffixRule {
        suffix: "_front",
        side: Side::Top,
        counterparts: &["_back"],
    },
    SuffixRule {
        suffix: "_back",
        side: Side::Bottom,
        counterparts: &["_front"],
    },
    SuffixRule {
        suffix: "_top",
        side: Side::Top,
        counterparts: &["_bot", "_bottom"],
    },
    SuffixRule {
        suffix: "_bot",
        side: Side::Bottom,
        counterparts: &["_top"],
    },
    SuffixRule {
        suffix: "_bottom",
        side: Side::Bottom,
        counterparts: &["_top"],
    },
];

/// One placement file to read, with the side its name implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementSource {
    pub path: PathBuf,
    pub side: Option<Side>,
}

/// Side implied by the file name, if its stem ends in a known top/bottom suffix.
pub fn side_from_file_name(path: &Path) -> Option<Side> {
    split_stem(path).map(|(_, rule)| rule.side)
}

fn split_stem(path: &Path) -> Option<(String, &'static SuffixRule)> {
    let stem = path.file_stem()?.to_str()?;
    SUFFIX_RULES.iter().find_map(|rule| {
        let cut = stem.len().checked_sub(rule.suffix.len())?;
        let tail = stem.get(cut..)?;
        tail.eq_ignore_ascii_case(rule.suffix)
            .then(|| (stem[..cut].to_string(), rule))
    })
}

/// Counterpart paths to look for, in preference order. Empty if the name has no known suffix.
pub fn counterpart_candidates(path: &Path) -> Vec<PathBuf> {
    let Some((base, rule)) = split_stem(path) else {
        return Vec::new();
    };
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    rule.counterparts
        .iter()
        .map(|suffix| dir.join(format!("{base}{suffix}{extension}")))
        .collect()
}

/// Files to read for `path`: the file itself and, when found, its counterpart.
/// The top file always comes first. A missing counterpart is a warning only.
pub fn resolve_placement_files(
    path: &Path,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<PlacementSource>> {
    if !path.is_file() {
        return Err(ConvertError::MissingFile(path.to_path_buf()));
    }
    let Some(side) = side_from_file_name(path) else {
        debug!(
            "{}: no top/bottom suffix, side must come from the file",
            path.display()
        );
        return Ok(vec![PlacementSource {
            path: path.to_path_buf(),
            side: None,
        }]);
    };
    let given = PlacementSource {
        path: path.to_path_buf(),
        side: Some(side),
    };

    let candidates = counterpart_candidates(path);
    let Some(found) = candidates.iter().find(|c| c.is_file()) else {
        let w = Warning::CounterpartFileMissing {
            given: path.to_path_buf(),
            expected: candidates.first().cloned().unwrap_or_default(),
        };
        warn!("{w}");
        warnings.push(w);
        return Ok(vec![given]);
    };
    let other_side = match side {
        Side::Top => Side::Bottom,
        Side::Bottom => Side::Top,
    };
    debug!("{}: paired with {}", path.display(), found.display());
    let other = PlacementSource {
        path: found.clone(),
        side: Some(other_side),
    };
    Ok(match side {
        Side::Top => vec![given, other],
        Side::Bottom => vec![other, given],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn side_from_suffix() {
        assert_eq!(
            side_from_file_name(Path::new("a/board_front.csv")),
            Some(Side::Top)
        );
        assert_eq!(
            side_from_file_name(Path::new("board_BACK.csv")),
            Some(Side::Bottom)
        );
        assert_eq!(side_from_file_name(Path::new("x_bot.csv")), Some(Side::Bottom));
        assert_eq!(side_from_file_name(Path::new("x_bottom.csv")), Some(Side::Bottom));
        assert_eq!(side_from_file_name(Path::new("x_top.csv")), Some(Side::Top));
        assert_eq!(side_from_file_name(Path::new("board.csv")), None);
        assert_eq!(side_from_file_name(Path::new("frontpanel.csv")), None);
    }

    #[test]
    fn counterpart_keeps_base_and_extension() {
        assert_eq!(
            counterpart_candidates(Path::new("out/Board_Front.csv")),
            vec![PathBuf::from("out/Board_back.csv")]
        );
        assert_eq!(
            counterpart_candidates(Path::new("b_top.txt")),
            vec![PathBuf::from("b_bot.txt"), PathBuf::from("b_bottom.txt")]
        );
        assert!(counterpart_candidates(Path::new("board.csv")).is_empty());
    }

    #[test]
    fn both_files_top_first() {
        let dir = tempfile::tempdir().unwrap();
        let front = dir.path().join("b_front.csv");
        let back = dir.path().join("b_back.csv");
        fs::write(&front, "Name,X,Y,Angle\n").unwrap();
        fs::write(&back, "Name,X,Y,Angle\n").unwrap();

        let mut warnings = Vec::new();
        let sources = resolve_placement_files(&back, &mut warnings).unwrap();
        assert_eq!(
            sources,
            vec![
                PlacementSource {
                    path: front.clone(),
                    side: Some(Side::Top)
                },
                PlacementSource {
                    path: back.clone(),
                    side: Some(Side::Bottom)
                },
            ]
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn missing_counterpart_warns() {
        let dir = tempfile::tempdir().unwrap();
        let back = dir.path().join("b_back.csv");
        fs::write(&back, "Name,X,Y,Angle\n").unwrap();

        let mut warnings = Vec::new();
        let sources = resolve_placement_files(&back, &mut warnings).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].side, Some(Side::Bottom));
        assert_eq!(
            warnings,
            vec![Warning::CounterpartFileMissing {
                given: back.clone(),
                expected: dir.path().join("b_front.csv"),
            }]
        );
    }

    #[test]
    fn missing_given_file_is_an_error() {
        let err = resolve_placement_files(Path::new("test_input/nope_front.csv"), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, ConvertError::MissingFile(_)));
    }
}
