use crate::csv_util::{SourceRow, SourceTable, load_table};
use crate::designator::{Designator, split_designators};
use crate::error::{Result, Warning};
use crate::format::{Artifact, EcadFamily, Field, Unit, Variant};
use crate::writer::{TargetRecord, format_fixed, format_rotation};
use log::{debug, warn};
use std::path::Path;
use strum::Display;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display)]
pub enum Side {
    Top,
    Bottom,
}

impl Side {
    /// "T"/"B", "top"/"bottom", "front"/"back", or a layer name such as "TopLayer", "F.Cu".
    pub fn parse(s: &str) -> Option<Side> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "t" | "f" | "top" | "front" | "f.cu" => return Some(Side::Top),
            "b" | "bottom" | "back" | "b.cu" => return Some(Side::Bottom),
            _ => {}
        }
        if s.contains("top") {
            Some(Side::Top)
        } else if s.contains("bot") {
            Some(Side::Bottom)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentPosition {
    pub designator: Designator,
    /// mm
    pub x: f64,
    /// mm
    pub y: f64,
    /// Degrees in [0, 360).
    pub rotation: f64,
    pub side: Side,
    /// Layer as spelled by the source, if it had a side column.
    pub layer: Option<String>,
}

/// Reduce into [0, 360). Never returns -0.0 or 360.0.
pub fn normalize_rotation(degrees: f64) -> f64 {
    let r = degrees.rem_euclid(360.0) + 0.0;
    if r >= 360.0 { 0.0 } else { r }
}

/// Parse a coordinate cell in `unit`, optionally carrying the unit suffix, into mm.
pub fn parse_coordinate(cell: &str, unit: Unit) -> Option<f64> {
    let lower = cell.trim().to_lowercase();
    let mut number = lower.as_str();
    for suffix in unit.suffixes().iter().chain(Unit::Millimeter.suffixes()) {
        if let Some(stripped) = number.strip_suffix(suffix) {
            if *suffix == "mm" && unit != Unit::Millimeter {
                // explicit mm overrides the variant unit
                return stripped.trim().parse::<f64>().ok().filter(|v| v.is_finite());
            }
            number = stripped.trim();
            break;
        }
    }
    number
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v * unit.to_mm())
}

/// Map one placement row. `file_side` is the side implied by the file name, it wins over
/// an in-file side column. `Ok(None)` for rows that carry no data.
pub fn map_placement_row(
    table: &SourceTable,
    row: &SourceRow,
    file_side: Option<Side>,
    warnings: &mut Vec<Warning>,
) -> Result<Option<ComponentPosition>> {
    if row.is_blank() || table.is_unmapped_blank(row) {
        return Ok(None);
    }
    let variant = table.detected.variant;

    let designators = split_designators(table.required(row, Field::Designator)?);
    let designator = match designators.as_slice() {
        [d] => d.clone(),
        [] => return Err(table.malformed(row, Field::Designator, "no designator")),
        _ => {
            return Err(table.malformed(
                row,
                Field::Designator,
                "placement row names more than one designator",
            ));
        }
    };

    let x_cell = table.required(row, Field::X)?;
    let x = parse_coordinate(x_cell, variant.unit)
        .ok_or_else(|| table.malformed(row, Field::X, format!("'{x_cell}' is not a number")))?;
    let y_cell = table.required(row, Field::Y)?;
    let y = parse_coordinate(y_cell, variant.unit)
        .ok_or_else(|| table.malformed(row, Field::Y, format!("'{y_cell}' is not a number")))?;

    let rotation_cell = table.required(row, Field::Rotation)?;
    let rotation = rotation_cell
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite())
        .ok_or_else(|| {
            table.malformed(
                row,
                Field::Rotation,
                format!("'{rotation_cell}' is not a number"),
            )
        })?;
    let rotation = normalize_rotation(variant.rotation.apply(rotation));

    let layer = table.value(row, Field::Side).map(str::to_string);
    let stated = match &layer {
        Some(l) => Some(Side::parse(l).ok_or_else(|| {
            table.malformed(row, Field::Side, format!("unknown board side '{l}'"))
        })?),
        None => None,
    };
    let side = match (file_side, stated) {
        (Some(file_side), Some(stated)) if file_side != stated => {
            let w = Warning::SideOverridden {
                path: table.path.clone(),
                row: row.line,
                designator: designator.clone(),
                stated: layer.clone().unwrap_or_default(),
                side: file_side,
            };
            warn!("{w}");
            warnings.push(w);
            file_side
        }
        (Some(side), _) | (None, Some(side)) => side,
        (None, None) => {
            return Err(table.malformed(
                row,
                Field::Side,
                "no side column and the file name does not tell the side",
            ));
        }
    };

    Ok(Some(ComponentPosition {
        designator,
        x,
        y,
        rotation,
        side,
        layer,
    }))
}

/// Load all component positions of one placement file, in file order.
pub fn load_component_positions(
    path: &Path,
    family: EcadFamily,
    file_side: Option<Side>,
    warnings: &mut Vec<Warning>,
) -> Result<(&'static Variant, Vec<ComponentPosition>)> {
    let table = load_table(path, family, Artifact::Placement)?;
    let mut positions = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        match map_placement_row(&table, row, file_side, warnings)? {
            Some(position) => positions.push(position),
            None => debug!("{}:{}: empty row skipped", path.display(), row.line),
        }
    }
    Ok((table.detected.variant, positions))
}

/// Placement record in the assembly house column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPlacementRow {
    pub designator: String,
    pub mid_x: String,
    pub mid_y: String,
    pub layer: String,
    pub rotation: String,
}

impl From<&ComponentPosition> for TargetPlacementRow {
    fn from(p: &ComponentPosition) -> Self {
        TargetPlacementRow {
            designator: p.designator.to_string(),
            mid_x: format_fixed(p.x, 4),
            mid_y: format_fixed(p.y, 4),
            layer: p.side.to_string(),
            rotation: format_rotation(p.rotation),
        }
    }
}

impl TargetRecord for TargetPlacementRow {
    const HEADER: &'static [&'static str] = &["Designator", "Mid X", "Mid Y", "Layer", "Rotation"];

    fn fields(&self) -> Vec<&str> {
        vec![
            self.designator.as_str(),
            self.mid_x.as_str(),
            self.mid_y.as_str(),
            self.layer.as_str(),
            self.rotation.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;

    fn kicad(path: &str) -> Result<Vec<ComponentPosition>> {
        load_component_positions(Path::new(path), EcadFamily::KiCad, None, &mut Vec::new())
            .map(|(_, positions)| positions)
    }

    fn find<'a>(positions: &'a [ComponentPosition], d: &str) -> &'a ComponentPosition {
        positions
            .iter()
            .find(|p| p.designator.as_str() == d)
            .unwrap()
    }

    #[test]
    fn can_read_pnp_kicad() {
        let positions = kicad("test_input/pnp_kicad.csv").unwrap();
        let pos_r1 = find(&positions, "R1");
        assert_eq!(pos_r1.x, 56.6);
        assert_eq!(pos_r1.side, Side::Bottom);
        let pos_c1 = find(&positions, "C1");
        assert_eq!(pos_c1.y, 5.85);
        assert_eq!(pos_c1.side, Side::Top);
        assert_eq!(pos_c1.rotation, 90.0);
    }

    #[test]
    fn can_read_pnp_kicad_inch() {
        let positions = kicad("test_input/pnp_kicad_inch.csv").unwrap();
        let pos_u1 = find(&positions, "U1");
        assert!((pos_u1.x - 25.4).abs() < 1e-9);
        assert!((pos_u1.y - 12.7).abs() < 1e-9);
    }

    #[test]
    fn can_read_pnp_fusion_mil() {
        let (variant, positions) = load_component_positions(
            Path::new("test_input/pnp_fusion_mil_front.csv"),
            EcadFamily::Fusion,
            Some(Side::Top),
            &mut Vec::new(),
        )
        .unwrap();
        assert_eq!(variant.id, "fusion-pos-mil");
        let pos_r1 = find(&positions, "R1");
        assert!((pos_r1.x - 2.54).abs() < 1e-9);
        assert!((pos_r1.y - 25.4).abs() < 1e-9);
        assert_eq!(pos_r1.side, Side::Top);
    }

    #[test]
    fn rotation_is_reduced() {
        assert_eq!(normalize_rotation(370.0), 10.0);
        assert_eq!(normalize_rotation(-30.0), 330.0);
        assert_eq!(normalize_rotation(360.0), 0.0);
        assert_eq!(normalize_rotation(-720.0), 0.0);
        assert!(normalize_rotation(-0.0).is_sign_positive());
        assert_eq!(normalize_rotation(-1e-20), 0.0);
    }

    #[test]
    fn side_spellings() {
        for s in ["T", "top", "TOP", "TopLayer", "F.Cu", "front", "Top Layer"] {
            assert_eq!(Side::parse(s), Some(Side::Top), "{s}");
        }
        for s in ["B", "bottom", "Bottom", "BottomLayer", "B.Cu", "back", "bot"] {
            assert_eq!(Side::parse(s), Some(Side::Bottom), "{s}");
        }
        assert_eq!(Side::parse("middle"), None);
        assert_eq!(Side::parse(""), None);
    }

    #[test]
    fn coordinates() {
        assert_eq!(parse_coordinate("12.5", Unit::Millimeter), Some(12.5));
        assert_eq!(parse_coordinate("12.5mm", Unit::Millimeter), Some(12.5));
        assert_eq!(parse_coordinate("-1", Unit::Inch), Some(-25.4));
        let mil = parse_coordinate("1000mil", Unit::Mil).unwrap();
        assert!((mil - 25.4).abs() < 1e-9);
        assert_eq!(parse_coordinate("3mm", Unit::Mil), Some(3.0));
        assert_eq!(parse_coordinate("abc", Unit::Millimeter), None);
        assert_eq!(parse_coordinate("inf", Unit::Millimeter), None);
        assert_eq!(parse_coordinate("", Unit::Millimeter), None);
    }

    #[test]
    fn unknown_side_is_malformed() {
        let err = kicad("test_input/pnp_kicad_bad_side.csv").unwrap_err();
        match err {
            ConvertError::MalformedRow { row, field, .. } => {
                assert_eq!(row, 3);
                assert_eq!(field, "side");
            }
            e => panic!("unexpected {e:?}"),
        }
    }

    #[test]
    fn non_numeric_coordinate_is_malformed() {
        let err = kicad("test_input/pnp_kicad_bad_x.csv").unwrap_err();
        assert!(
            matches!(err, ConvertError::MalformedRow { row: 2, ref field, .. } if field == "x")
        );
    }

    #[test]
    fn file_side_overrides_column() {
        let mut warnings = Vec::new();
        let (_, positions) = load_component_positions(
            Path::new("test_input/pnp_kicad.csv"),
            EcadFamily::KiCad,
            Some(Side::Top),
            &mut warnings,
        )
        .unwrap();
        assert!(positions.iter().all(|p| p.side == Side::Top));
        assert_eq!(warnings.len(), 1);
        assert!(matches!(&warnings[0], Warning::SideOverridden { designator, .. } if designator.as_str() == "R1"));
    }

    #[test]
    fn target_row_formatting() {
        let p = ComponentPosition {
            designator: Designator::new("U3"),
            x: 10.0,
            y: -0.00001,
            rotation: 359.999,
            side: Side::Bottom,
            layer: None,
        };
        let row = TargetPlacementRow::from(&p);
        assert_eq!(row.fields(), ["U3", "10.0000", "0.0000", "Bottom", "0.00"]);
    }
}
