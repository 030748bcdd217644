//! Records flowing through one scrape run.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Label written for rows that do not reach the target multiplier.
pub const NOT_QUALIFYING_LABEL: &str = "NA";

// ============================================================================
// Leverage
// ============================================================================

/// One instrument from the margin calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeverageRecord {
    /// Upper-cased, trimmed instrument code
    pub code: String,
    /// Display token: `5x` for numeric multipliers, raw text otherwise
    pub multiplier: String,
}

impl LeverageRecord {
    /// Normalize one scraped row. Rows without a code yield `None`; a missing
    /// multiplier counts as `"0"`.
    pub fn from_raw(code: Option<&str>, multiplier: Option<&str>) -> Option<Self> {
        let code = code.map(str::trim).filter(|c| !c.is_empty())?;
        let multiplier = multiplier.unwrap_or("0").trim();
        Some(Self {
            code: code.to_uppercase(),
            multiplier: display_multiplier(multiplier),
        })
    }
}

fn display_multiplier(raw: &str) -> String {
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        format!("{raw}x")
    } else {
        raw.to_string()
    }
}

/// Codes whose multiplier equals the target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualifyingSet {
    codes: HashSet<String>,
}

impl QualifyingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: impl AsRef<str>) -> bool {
        self.codes.insert(code.as_ref().trim().to_uppercase())
    }

    /// Case-insensitive membership.
    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(&code.trim().to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for QualifyingSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for code in iter {
            set.insert(code);
        }
        set
    }
}

/// Everything the leverage collector learned: the full code→multiplier map
/// plus the qualifying subset.
#[derive(Debug, Clone, Default)]
pub struct LeverageTable {
    target: String,
    mapping: HashMap<String, String>,
    qualifying: QualifyingSet,
}

impl LeverageTable {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into().trim().to_string(),
            ..Self::default()
        }
    }

    /// Build a table from raw `(code, multiplier)` attribute pairs.
    pub fn from_rows<I, C, M>(target: &str, rows: I) -> Self
    where
        I: IntoIterator<Item = (Option<C>, Option<M>)>,
        C: AsRef<str>,
        M: AsRef<str>,
    {
        let mut table = Self::new(target);
        for (code, multiplier) in rows {
            table.insert(
                code.as_ref().map(|c| c.as_ref()),
                multiplier.as_ref().map(|m| m.as_ref()),
            );
        }
        table
    }

    /// Record one row. Returns `false` when the row has no usable code.
    ///
    /// A later row for the same code replaces its mapping entry; qualifying
    /// membership is only ever added.
    pub fn insert(&mut self, code: Option<&str>, multiplier: Option<&str>) -> bool {
        let Some(record) = LeverageRecord::from_raw(code, multiplier) else {
            return false;
        };
        if multiplier.unwrap_or("0").trim() == self.target {
            self.qualifying.insert(&record.code);
        }
        self.mapping.insert(record.code, record.multiplier);
        true
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn qualifying(&self) -> &QualifyingSet {
        &self.qualifying
    }

    /// Display multiplier for `code`, if the code was seen.
    pub fn multiplier(&self, code: &str) -> Option<&str> {
        self.mapping
            .get(&code.trim().to_uppercase())
            .map(String::as_str)
    }

    /// Number of distinct codes seen.
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

// ============================================================================
// Gainers
// ============================================================================

/// A ranked gainer with both fields extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainerRecord {
    pub display_name: String,
    pub exchange_code: String,
}

impl GainerRecord {
    pub fn new(display_name: impl Into<String>, exchange_code: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            exchange_code: exchange_code.into(),
        }
    }

    /// A record exists only when both parts were extracted.
    pub fn from_parts(display_name: Option<String>, exchange_code: Option<String>) -> Option<Self> {
        Some(Self {
            display_name: display_name?,
            exchange_code: exchange_code?,
        })
    }
}

// ============================================================================
// Merged
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeverageTag {
    Qualifies,
    DoesNotQualify,
}

impl LeverageTag {
    pub fn qualifies(self) -> bool {
        matches!(self, Self::Qualifies)
    }

    /// Output column text: `<target>x` or `NA`.
    pub fn label(self, target: &str) -> String {
        match self {
            Self::Qualifies => format!("{target}x"),
            Self::DoesNotQualify => NOT_QUALIFYING_LABEL.to_string(),
        }
    }

    /// Inverse of [`label`](Self::label): `NA` is the only non-qualifying text.
    pub fn from_label(label: &str) -> Self {
        if label.trim() == NOT_QUALIFYING_LABEL {
            Self::DoesNotQualify
        } else {
            Self::Qualifies
        }
    }
}

impl fmt::Display for LeverageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Qualifies => write!(f, "qualifies"),
            Self::DoesNotQualify => write!(f, "does not qualify"),
        }
    }
}

/// A gainer joined with its leverage tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedRecord {
    pub display_name: String,
    pub exchange_code: String,
    pub leverage_tag: LeverageTag,
}

impl MergedRecord {
    pub fn new(gainer: &GainerRecord, leverage_tag: LeverageTag) -> Self {
        Self {
            display_name: gainer.display_name.clone(),
            exchange_code: gainer.exchange_code.clone(),
            leverage_tag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leverage_record_normalization() {
        let record = LeverageRecord::from_raw(Some("  infy "), Some(" 5 ")).unwrap();
        assert_eq!(record.code, "INFY");
        assert_eq!(record.multiplier, "5x");

        let record = LeverageRecord::from_raw(Some("TCS"), None).unwrap();
        assert_eq!(record.multiplier, "0x");

        let record = LeverageRecord::from_raw(Some("XYZ"), Some("N/A")).unwrap();
        assert_eq!(record.multiplier, "N/A");

        assert!(LeverageRecord::from_raw(None, Some("5")).is_none());
        assert!(LeverageRecord::from_raw(Some("   "), Some("5")).is_none());
    }

    #[test]
    fn test_table_from_rows() {
        let table = LeverageTable::from_rows(
            "5",
            [
                (Some("INFY"), Some("5")),
                (Some("TCS"), Some("4")),
                (Some("WIPRO"), Some("5")),
            ],
        );

        let expected: QualifyingSet = ["INFY", "WIPRO"].into_iter().collect();
        assert_eq!(table.qualifying(), &expected);
        assert_eq!(table.len(), 3);
        assert_eq!(table.multiplier("tcs"), Some("4x"));
    }

    #[test]
    fn test_table_skips_missing_codes() {
        let mut table = LeverageTable::new("5");
        assert!(!table.insert(None, Some("5")));
        assert!(!table.insert(Some(""), Some("5")));
        assert!(table.insert(Some("sbin"), None));
        assert_eq!(table.len(), 1);
        assert!(table.qualifying().is_empty());
    }

    #[test]
    fn test_duplicate_code_keeps_membership() {
        let mut table = LeverageTable::new("5");
        table.insert(Some("INFY"), Some("5"));
        table.insert(Some("infy"), Some("3"));
        assert_eq!(table.len(), 1);
        assert_eq!(table.multiplier("INFY"), Some("3x"));
        assert!(table.qualifying().contains("INFY"));
    }

    #[test]
    fn test_qualifying_set_is_case_insensitive() {
        let set: QualifyingSet = ["WIPRO"].into_iter().collect();
        assert!(set.contains("wipro"));
        assert!(set.contains(" Wipro "));
        assert!(!set.contains("INFY"));
    }

    #[test]
    fn test_gainer_requires_both_parts() {
        assert!(GainerRecord::from_parts(Some("Infosys".into()), Some("INFY".into())).is_some());
        assert!(GainerRecord::from_parts(None, Some("INFY".into())).is_none());
        assert!(GainerRecord::from_parts(Some("Infosys".into()), None).is_none());
    }

    #[test]
    fn test_tag_labels() {
        assert_eq!(LeverageTag::Qualifies.label("5"), "5x");
        assert_eq!(LeverageTag::DoesNotQualify.label("5"), "NA");
        assert_eq!(LeverageTag::from_label("5x"), LeverageTag::Qualifies);
        assert_eq!(LeverageTag::from_label("NA"), LeverageTag::DoesNotQualify);
    }
}
