use crate::bom::{TargetBomRow, aggregate, load_bom_components, sort_by_first_designator};
use crate::designator::Designator;
use crate::error::{ConvertError, Result, Warning};
use crate::format::EcadFamily;
use crate::paired::{PlacementSource, resolve_placement_files};
use crate::pnp::{ComponentPosition, TargetPlacementRow, load_component_positions};
use crate::writer::write_records;
use log::info;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    /// Output files are `<prefix>_bom.csv` and `<prefix>_pos.csv`.
    pub output_prefix: String,
    pub output_dir: PathBuf,
    /// Order BOM lines by their first designator instead of first appearance.
    pub sort_by_designator: bool,
    /// Joins the designators of one BOM line.
    pub designator_separator: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        ConvertConfig {
            output_prefix: "JLC".to_string(),
            output_dir: PathBuf::from("."),
            sort_by_designator: false,
            designator_separator: ", ".to_string(),
        }
    }
}

impl ConvertConfig {
    pub fn bom_output(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_bom.csv", self.output_prefix))
    }

    pub fn pos_output(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_pos.csv", self.output_prefix))
    }
}

#[derive(Debug)]
pub struct ConversionReport {
    pub output: PathBuf,
    pub inputs: Vec<PathBuf>,
    /// Detected variant of each input.
    pub variants: Vec<&'static str>,
    /// Rows written, header excluded.
    pub records: usize,
    pub warnings: Vec<Warning>,
}

/// Convert a BOM export into `<prefix>_bom.csv`. Nothing is written on error.
pub fn convert_bom(
    family: EcadFamily,
    input: &Path,
    config: &ConvertConfig,
) -> Result<ConversionReport> {
    if !input.is_file() {
        return Err(ConvertError::MissingFile(input.to_path_buf()));
    }
    let mut warnings = Vec::new();
    let (variant, components) = load_bom_components(input, family)?;
    let line_count = components.len();
    let mut groups = aggregate(components, &mut warnings)?;
    if config.sort_by_designator {
        sort_by_first_designator(&mut groups);
    }
    let rows = groups
        .iter()
        .map(|g| TargetBomRow::new(g, variant.comment, &config.designator_separator))
        .collect::<Vec<_>>();

    let output = config.bom_output();
    write_records(&output, &rows)?;
    info!(
        "{}: {} lines as {}, {} parts written to {}",
        input.display(),
        line_count,
        variant.id,
        rows.len(),
        output.display()
    );
    Ok(ConversionReport {
        output,
        inputs: vec![input.to_path_buf()],
        variants: vec![variant.id],
        records: rows.len(),
        warnings,
    })
}

/// Convert a placement export into `<prefix>_pos.csv`. For families exporting a
/// `_front`/`_back` pair, the counterpart of `input` is picked up as well.
pub fn convert_positions(
    family: EcadFamily,
    input: &Path,
    config: &ConvertConfig,
) -> Result<ConversionReport> {
    let mut warnings = Vec::new();
    let sources = if family.splits_placement_files() {
        resolve_placement_files(input, &mut warnings)?
    } else {
        if !input.is_file() {
            return Err(ConvertError::MissingFile(input.to_path_buf()));
        }
        vec![PlacementSource {
            path: input.to_path_buf(),
            side: None,
        }]
    };

    let mut positions: Vec<ComponentPosition> = Vec::new();
    let mut origin: HashMap<Designator, PathBuf> = HashMap::new();
    let mut variants = Vec::new();
    for source in &sources {
        let (variant, loaded) =
            load_component_positions(&source.path, family, source.side, &mut warnings)?;
        variants.push(variant.id);
        for position in loaded {
            if let Some(first) = origin.get(&position.designator) {
                return Err(ConvertError::DuplicateDesignator {
                    designator: position.designator,
                    first: first.display().to_string(),
                    second: source.path.display().to_string(),
                });
            }
            origin.insert(position.designator.clone(), source.path.clone());
            positions.push(position);
        }
    }

    let rows = positions
        .iter()
        .map(TargetPlacementRow::from)
        .collect::<Vec<_>>();
    let output = config.pos_output();
    write_records(&output, &rows)?;
    info!(
        "{} placements from {} file(s) written to {}",
        rows.len(),
        sources.len(),
        output.display()
    );
    Ok(ConversionReport {
        output,
        inputs: sources.into_iter().map(|s| s.path).collect(),
        variants,
        records: rows.len(),
        warnings,
    })
}
