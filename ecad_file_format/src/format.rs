//! Known export variants of the supported ECAD tools and header based detection.
//!
//! Every variant is a row in [`VARIANTS`]: which target fields it carries, which header
//! spellings name each field, and how numeric values have to be transformed. Detection
//! never depends on column order and ignores columns it does not know.

use strum::{Display, EnumIter};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum EcadFamily {
    #[strum(serialize = "Fusion/Eagle")]
    Fusion,
    #[strum(serialize = "KiCad")]
    KiCad,
}

impl EcadFamily {
    /// Tools of this family export placement as a `_front`/`_back` file pair.
    pub fn splits_placement_files(&self) -> bool {
        matches!(self, EcadFamily::Fusion)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display)]
pub enum Artifact {
    #[strum(serialize = "BOM")]
    Bom,
    #[strum(serialize = "placement")]
    Placement,
}

/// Target-side meaning of a source column.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    Designator,
    Value,
    Footprint,
    /// Manufacturer part number.
    Mpn,
    /// LCSC / JLCPCB part number.
    Lcsc,
    /// Do-not-populate marker.
    Dnp,
    X,
    Y,
    Rotation,
    Side,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeaderMatch {
    Exact(&'static str),
    Contains(&'static str),
}

impl HeaderMatch {
    /// `column` must already be passed through [`normalize_header`].
    pub fn matches(&self, column: &str) -> bool {
        match self {
            HeaderMatch::Exact(s) => normalize_header(s) == column,
            HeaderMatch::Contains(s) => column.contains(&normalize_header(s)),
        }
    }
}

/// Lower case, no whitespace, no surrounding quotes: `" MFG Part  Number"` -> `mfgpartnumber`.
pub fn normalize_header(name: &str) -> String {
    name.trim()
        .trim_matches('"')
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: Field,
    pub required: bool,
    /// In priority order.
    pub spellings: &'static [HeaderMatch],
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
pub enum Unit {
    #[strum(serialize = "mm")]
    Millimeter,
    #[strum(serialize = "mil")]
    Mil,
    #[strum(serialize = "in")]
    Inch,
}

impl Unit {
    pub fn to_mm(&self) -> f64 {
        match self {
            Unit::Millimeter => 1.0,
            Unit::Mil => 0.0254,
            Unit::Inch => 25.4,
        }
    }

    /// Suffixes some exports append to every coordinate cell.
    pub fn suffixes(&self) -> &'static [&'static str] {
        match self {
            Unit::Millimeter => &["mm"],
            Unit::Mil => &["mils", "mil"],
            Unit::Inch => &["in", "\""],
        }
    }
}

/// `sign * source_angle + offset`, applied before reducing to [0, 360).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RotationTransform {
    pub sign: f64,
    pub offset: f64,
}

impl RotationTransform {
    pub const IDENTITY: RotationTransform = RotationTransform {
        sign: 1.0,
        offset: 0.0,
    };

    pub fn apply(&self, degrees: f64) -> f64 {
        self.sign * degrees + self.offset
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommentStyle {
    /// Comment is the component value.
    Value,
    /// Value followed by the MPN, or by the component kind guessed from the designator.
    Described,
}

#[derive(Debug, PartialEq)]
pub struct Variant {
    pub id: &'static str,
    pub family: EcadFamily,
    pub artifact: Artifact,
    pub fields: &'static [FieldSpec],
    pub unit: Unit,
    pub rotation: RotationTransform,
    pub comment: CommentStyle,
}

impl Variant {
    pub fn spec(&self, field: Field) -> Option<&FieldSpec> {
        self.fields.iter().find(|s| s.field == field)
    }

    /// Map this variant's fields onto `header`. `None` if a required field has no column.
    /// A column is claimed by the first field (in table order) whose spelling matches it.
    pub fn resolve(&self, header: &[String]) -> Option<ColumnMap> {
        let normalized = header
            .iter()
            .map(|h| normalize_header(h))
            .collect::<Vec<_>>();
        let mut claimed = vec![false; normalized.len()];
        let mut map = ColumnMap::default();
        for spec in self.fields {
            let mut columns = Vec::new();
            for spelling in spec.spellings {
                for (idx, name) in normalized.iter().enumerate() {
                    if !claimed[idx] && !name.is_empty() && spelling.matches(name) {
                        claimed[idx] = true;
                        columns.push(idx);
                    }
                }
            }
            if columns.is_empty() {
                if spec.required {
                    return None;
                }
                continue;
            }
            map.columns.push((spec.field, columns));
        }
        Some(map)
    }
}

/// Field -> source column indices, in spelling priority order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    columns: Vec<(Field, Vec<usize>)>,
}

impl ColumnMap {
    pub fn columns(&self, field: Field) -> &[usize] {
        self.columns
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, c)| c.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, field: Field) -> bool {
        !self.columns(field).is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.columns.iter().map(|(f, _)| *f)
    }

    /// Specificity of the match: how many fields found a column.
    pub fn matched(&self) -> usize {
        self.columns.len()
    }
}

#[derive(Debug)]
pub struct Detected<'a> {
    pub variant: &'a Variant,
    pub columns: ColumnMap,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DetectError {
    Unrecognized,
    Ambiguous(Vec<&'static str>),
}

/// Pick the candidate that matches the most fields of `header`.
/// Equal best specificity between different variants is ambiguous.
pub fn detect_variant<'a>(
    header: &[String],
    candidates: impl IntoIterator<Item = &'a Variant>,
) -> Result<Detected<'a>, DetectError> {
    let mut best: Vec<Detected<'a>> = Vec::new();
    for variant in candidates {
        let Some(columns) = variant.resolve(header) else {
            continue;
        };
        match best.first().map(|d| d.columns.matched()) {
            Some(score) if score > columns.matched() => {}
            Some(score) if score == columns.matched() => best.push(Detected { variant, columns }),
            _ => best = vec![Detected { variant, columns }],
        }
    }
    match best.len() {
        0 => Err(DetectError::Unrecognized),
        1 => Ok(best.remove(0)),
        _ => Err(DetectError::Ambiguous(
            best.iter().map(|d| d.variant.id).collect(),
        )),
    }
}

pub fn detect_format(
    family: EcadFamily,
    artifact: Artifact,
    header: &[String],
) -> Result<Detected<'static>, DetectError> {
    detect_variant(header, variants(family, artifact))
}

pub fn variants(family: EcadFamily, artifact: Artifact) -> impl Iterator<Item = &'static Variant> {
    VARIANTS
        .iter()
        .filter(move |v| v.family == family && v.artifact == artifact)
}

pub fn variant_by_id(id: &str) -> Option<&'static Variant> {
    VARIANTS.iter().find(|v| v.id == id)
}

use HeaderMatch::{Contains, Exact};

const fn required(field: Field, spellings: &'static [HeaderMatch]) -> FieldSpec {
    FieldSpec {
        field,
        required: true,
        spellings,
    }
}

const fn optional(field: Field, spellings: &'static [HeaderMatch]) -> FieldSpec {
    FieldSpec {
        field,
        required: false,
        spellings,
    }
}

const FUSION_PART: &[HeaderMatch] = &[Exact("Part"), Exact("Parts")];
const FUSION_PACKAGE: &[HeaderMatch] = &[Exact("Package"), Exact("Footprint")];
const FUSION_POS_NAME: &[HeaderMatch] = &[Exact("Name"), Exact("Part")];
const FUSION_ANGLE: &[HeaderMatch] = &[Exact("Angle"), Exact("Rotation"), Exact("Rot")];
const FUSION_SIDE: &[HeaderMatch] = &[Exact("Side"), Exact("Layer")];

const KICAD_REFERENCE: &[HeaderMatch] = &[
    Exact("Reference"),
    Exact("References"),
    Exact("Refs"),
    Exact("Ref"),
];
const KICAD_VALUE: &[HeaderMatch] = &[Exact("Value"), Exact("Val")];
const KICAD_DNP: &[HeaderMatch] = &[Exact("DNP"), Exact("Do not populate")];
const KICAD_POS_REF: &[HeaderMatch] = &[
    Exact("Ref"),
    Exact("Reference"),
    Exact("Designator"),
    Exact("RefDes"),
];
const KICAD_ROT: &[HeaderMatch] = &[Exact("Rot"), Exact("Rotation")];
const KICAD_SIDE: &[HeaderMatch] = &[Exact("Side"), Exact("Layer")];

const MPN: &[HeaderMatch] = &[
    Exact("MPN"),
    Exact("MFG Part Number"),
    Exact("Manufacturer Part Number"),
];
const LCSC: &[HeaderMatch] = &[
    Exact("LCSC"),
    Exact("LCSC #"),
    Exact("LCSC Part"),
    Contains("LCSC Part"),
];

pub static VARIANTS: &[Variant] = &[
    Variant {
        id: "fusion-bom",
        family: EcadFamily::Fusion,
        artifact: Artifact::Bom,
        fields: &[
            required(Field::Designator, FUSION_PART),
            required(Field::Value, &[Exact("Value")]),
            required(Field::Footprint, FUSION_PACKAGE),
            optional(Field::Mpn, MPN),
            optional(Field::Lcsc, LCSC),
        ],
        unit: Unit::Millimeter,
        rotation: RotationTransform::IDENTITY,
        comment: CommentStyle::Value,
    },
    Variant {
        id: "fusion-pos",
        family: EcadFamily::Fusion,
        artifact: Artifact::Placement,
        fields: &[
            required(Field::Designator, FUSION_POS_NAME),
            required(Field::X, &[Exact("X"), Exact("X (mm)")]),
            required(Field::Y, &[Exact("Y"), Exact("Y (mm)")]),
            required(Field::Rotation, FUSION_ANGLE),
            optional(Field::Side, FUSION_SIDE),
        ],
        unit: Unit::Millimeter,
        rotation: RotationTransform::IDENTITY,
        comment: CommentStyle::Value,
    },
    Variant {
        id: "fusion-pos-mil",
        family: EcadFamily::Fusion,
        artifact: Artifact::Placement,
        fields: &[
            required(Field::Designator, FUSION_POS_NAME),
            required(Field::X, &[Exact("X (mil)")]),
            required(Field::Y, &[Exact("Y (mil)")]),
            required(Field::Rotation, FUSION_ANGLE),
            optional(Field::Side, FUSION_SIDE),
        ],
        unit: Unit::Mil,
        rotation: RotationTransform::IDENTITY,
        comment: CommentStyle::Value,
    },
    Variant {
        id: "kicad-bom-simple",
        family: EcadFamily::KiCad,
        artifact: Artifact::Bom,
        fields: &[
            required(Field::Designator, &[Exact("Designator")]),
            required(Field::Value, &[Exact("Designation")]),
            required(Field::Footprint, &[Exact("Footprint"), Exact("Package")]),
            optional(Field::Lcsc, &[Exact("Supplier and ref")]),
        ],
        unit: Unit::Millimeter,
        rotation: RotationTransform::IDENTITY,
        comment: CommentStyle::Value,
    },
    Variant {
        id: "kicad-bom",
        family: EcadFamily::KiCad,
        artifact: Artifact::Bom,
        fields: &[
            required(Field::Designator, KICAD_REFERENCE),
            required(Field::Value, KICAD_VALUE),
            required(Field::Footprint, &[Exact("Footprint")]),
            optional(Field::Mpn, MPN),
            optional(Field::Dnp, KICAD_DNP),
        ],
        unit: Unit::Millimeter,
        rotation: RotationTransform::IDENTITY,
        comment: CommentStyle::Value,
    },
    Variant {
        id: "kicad-bom-lcsc",
        family: EcadFamily::KiCad,
        artifact: Artifact::Bom,
        fields: &[
            required(Field::Designator, KICAD_REFERENCE),
            required(Field::Value, KICAD_VALUE),
            required(Field::Footprint, &[Exact("Footprint")]),
            required(
                Field::Lcsc,
                &[
                    Exact("LCSC #"),
                    Exact("China LCSC #"),
                    Exact("Alternate LCSC #"),
                    Exact("LCSC"),
                    Contains("LCSC Part"),
                ],
            ),
            optional(
                Field::Mpn,
                &[
                    Exact("MFG Part Number"),
                    Exact("China MFG PN"),
                    Exact("Alternate MFG Part Number"),
                    Exact("MPN"),
                ],
            ),
            optional(Field::Dnp, KICAD_DNP),
        ],
        unit: Unit::Millimeter,
        rotation: RotationTransform::IDENTITY,
        comment: CommentStyle::Described,
    },
    Variant {
        id: "kicad-pos",
        family: EcadFamily::KiCad,
        artifact: Artifact::Placement,
        fields: &[
            required(Field::Designator, KICAD_POS_REF),
            required(Field::X, &[Exact("PosX"), Exact("Center-X"), Exact("Mid X")]),
            required(Field::Y, &[Exact("PosY"), Exact("Center-Y"), Exact("Mid Y")]),
            required(Field::Rotation, KICAD_ROT),
            required(Field::Side, KICAD_SIDE),
        ],
        unit: Unit::Millimeter,
        rotation: RotationTransform::IDENTITY,
        comment: CommentStyle::Value,
    },
    Variant {
        id: "kicad-pos-inch",
        family: EcadFamily::KiCad,
        artifact: Artifact::Placement,
        fields: &[
            required(Field::Designator, KICAD_POS_REF),
            required(Field::X, &[Exact("PosX (in)")]),
            required(Field::Y, &[Exact("PosY (in)")]),
            required(Field::Rotation, KICAD_ROT),
            required(Field::Side, KICAD_SIDE),
        ],
        unit: Unit::Inch,
        rotation: RotationTransform::IDENTITY,
        comment: CommentStyle::Value,
    },
];
