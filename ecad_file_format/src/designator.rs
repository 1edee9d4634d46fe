use regex::Regex;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

static LIST_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[,;]\s*|\s+").expect("valid designator separator regex"));

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Designator(pub String);

impl Designator {
    pub fn new(s: impl Into<String>) -> Self {
        Designator(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading letters of the designator, upper-cased: "R" for "r12", "TP" for "TP3".
    pub fn prefix(&self) -> String {
        self.0
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .collect()
    }

    pub fn is_resistor(&self) -> bool {
        self.prefix() == "R"
    }

    pub fn is_capacitor(&self) -> bool {
        self.prefix() == "C"
    }

    pub fn is_inductor(&self) -> bool {
        self.prefix() == "L"
    }

    pub fn is_diode(&self) -> bool {
        self.prefix() == "D"
    }

    pub fn kind_name(&self) -> Option<&'static str> {
        if self.is_capacitor() {
            Some("Capacitor")
        } else if self.is_diode() {
            Some("Diode")
        } else if self.is_resistor() {
            Some("Resistor")
        } else if self.is_inductor() {
            Some("Inductor")
        } else {
            None
        }
    }

    /// "R2" before "R10".
    pub fn natural_cmp(&self, other: &Self) -> Ordering {
        natord::compare(&self.0, &other.0)
    }
}

impl Display for Designator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Split a designator cell such as `"R1, R2;R3 R4"` into individual designators.
/// Order is preserved and repeats are dropped.
pub fn split_designators(cell: &str) -> Vec<Designator> {
    let mut designators: Vec<Designator> = Vec::new();
    for part in LIST_SEPARATOR.split(cell.trim().trim_matches('"')) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let designator = Designator::new(part);
        if !designators.contains(&designator) {
            designators.push(designator);
        }
    }
    designators
}
