use crate::csv_util::{SourceRow, SourceTable, load_table};
use crate::designator::{Designator, split_designators};
use crate::error::{ConvertError, Result, Warning};
use crate::format::{Artifact, CommentStyle, EcadFamily, Field, Variant};
use crate::writer::TargetRecord;
use itertools::Itertools;
use log::{debug, warn};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BomComponent {
    /// Never empty, no repeats, first-seen order.
    pub designators: Vec<Designator>,
    pub value: String,
    pub footprint: String,
    pub mpn: Option<String>,
    pub lcsc: Option<String>,
}

impl BomComponent {
    /// Aggregation identity.
    pub fn key(&self) -> (&str, &str) {
        (&self.value, &self.footprint)
    }

    pub fn label(&self) -> String {
        format!("group '{}' / '{}'", self.value, self.footprint)
    }

    pub fn comment(&self, style: CommentStyle) -> String {
        match style {
            CommentStyle::Value => self.value.clone(),
            CommentStyle::Described => {
                if let Some(mpn) = &self.mpn {
                    return format!("{} {}", self.value, mpn);
                }
                match self.designators.first().and_then(|d| d.kind_name()) {
                    Some(kind) => format!("{} {}", self.value, kind),
                    None => self.value.clone(),
                }
            }
        }
    }
}

fn is_placeholder(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "n/a" | "na" | "-" | "~")
}

/// First usable part number among the columns mapped to `field`, in priority order.
fn part_number(table: &SourceTable, row: &SourceRow, field: Field) -> Option<String> {
    table
        .detected
        .columns
        .columns(field)
        .iter()
        .map(|idx| row.cell(*idx))
        .find(|c| !c.is_empty() && !is_placeholder(c))
        .map(str::to_string)
}

fn is_dnp(table: &SourceTable, row: &SourceRow) -> bool {
    match table.value(row, Field::Dnp) {
        Some(v) => !matches!(v.to_lowercase().as_str(), "0" | "no" | "false" | "n"),
        None => false,
    }
}

/// Map one BOM row. `Ok(None)` for blank rows, parts marked do-not-populate and parts
/// without a value (test points, fiducials, mounting holes).
pub fn map_bom_row(table: &SourceTable, row: &SourceRow) -> Result<Option<BomComponent>> {
    if row.is_blank() || table.is_unmapped_blank(row) {
        return Ok(None);
    }
    if is_dnp(table, row) {
        debug!(
            "{}:{}: {} not populated, skipped",
            table.path.display(),
            row.line,
            table.value(row, Field::Designator).unwrap_or("?")
        );
        return Ok(None);
    }
    let designators = split_designators(table.required(row, Field::Designator)?);
    if designators.is_empty() {
        return Err(table.malformed(row, Field::Designator, "no designator"));
    }
    let Some(value) = table.value(row, Field::Value).map(str::to_string) else {
        debug!(
            "{}:{}: {} has no value, skipped",
            table.path.display(),
            row.line,
            designators.iter().join(",")
        );
        return Ok(None);
    };
    let footprint = table.value(row, Field::Footprint).unwrap_or("").to_string();
    Ok(Some(BomComponent {
        designators,
        value,
        footprint,
        mpn: part_number(table, row, Field::Mpn),
        lcsc: part_number(table, row, Field::Lcsc),
    }))
}

/// Read a BOM file and map every row, in file order.
pub fn load_bom_components(
    path: &Path,
    family: EcadFamily,
) -> Result<(&'static Variant, Vec<BomComponent>)> {
    let table = load_table(path, family, Artifact::Bom)?;
    let mut components = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        if let Some(component) = map_bom_row(&table, row)? {
            components.push(component);
        }
    }
    Ok((table.detected.variant, components))
}

fn merge_part_number(
    kept: &mut Option<String>,
    incoming: Option<String>,
    field: Field,
    designators: &[Designator],
    warnings: &mut Vec<Warning>,
) {
    let Some(incoming) = incoming else {
        return;
    };
    let Some(k) = kept.as_ref() else {
        *kept = Some(incoming);
        return;
    };
    if *k != incoming {
        let w = Warning::ConflictingPartNumber {
            designators: designators.iter().join(","),
            field: field.to_string(),
            kept: k.clone(),
            dropped: incoming,
        };
        warn!("{w}");
        warnings.push(w);
    }
}

/// Group by (value, footprint), merging designators in first-seen order.
/// A designator may belong to one group only.
pub fn aggregate(
    components: Vec<BomComponent>,
    warnings: &mut Vec<Warning>,
) -> Result<Vec<BomComponent>> {
    let mut groups: Vec<BomComponent> = Vec::new();
    let mut group_of_key: HashMap<(String, String), usize> = HashMap::new();
    let mut group_of_designator: HashMap<Designator, usize> = HashMap::new();

    for component in components {
        let (value, footprint) = component.key();
        let key = (value.to_string(), footprint.to_string());
        let gi = *group_of_key.entry(key).or_insert_with(|| {
            groups.push(BomComponent {
                designators: Vec::new(),
                value: component.value.clone(),
                footprint: component.footprint.clone(),
                mpn: None,
                lcsc: None,
            });
            groups.len() - 1
        });

        for designator in component.designators {
            match group_of_designator.get(&designator) {
                Some(&owner) if owner == gi => {
                    debug!("{designator} listed twice in {}", groups[gi].label());
                }
                Some(&owner) => {
                    return Err(ConvertError::DuplicateDesignator {
                        designator,
                        first: groups[owner].label(),
                        second: groups[gi].label(),
                    });
                }
                None => {
                    group_of_designator.insert(designator.clone(), gi);
                    groups[gi].designators.push(designator);
                }
            }
        }

        let group = &mut groups[gi];
        merge_part_number(
            &mut group.mpn,
            component.mpn,
            Field::Mpn,
            &group.designators,
            warnings,
        );
        merge_part_number(
            &mut group.lcsc,
            component.lcsc,
            Field::Lcsc,
            &group.designators,
            warnings,
        );
    }
    Ok(groups)
}

/// Natural order of each group's first designator.
pub fn sort_by_first_designator(groups: &mut [BomComponent]) {
    groups.sort_by(|a, b| match (a.designators.first(), b.designators.first()) {
        (Some(a), Some(b)) => a.natural_cmp(b),
        (a, b) => a.is_some().cmp(&b.is_some()),
    });
}

/// BOM record in the assembly house column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetBomRow {
    pub comment: String,
    pub designator: String,
    pub footprint: String,
    pub part_number: String,
}

impl TargetBomRow {
    pub fn new(component: &BomComponent, style: CommentStyle, separator: &str) -> Self {
        TargetBomRow {
            comment: component.comment(style),
            designator: component.designators.iter().join(separator),
            footprint: component.footprint.clone(),
            part_number: component.lcsc.clone().unwrap_or_default(),
        }
    }
}

impl TargetRecord for TargetBomRow {
    const HEADER: &'static [&'static str] = &[
        "Comment",
        "Designator",
        "Footprint",
        "JLCPCB Part #（optional）",
    ];

    fn fields(&self) -> Vec<&str> {
        vec![
            self.comment.as_str(),
            self.designator.as_str(),
            self.footprint.as_str(),
            self.part_number.as_str(),
        ]
    }
}
