//! Join gainers with the qualifying-code set.

use crate::model::{GainerRecord, LeverageTag, MergedRecord, QualifyingSet};

/// Tag each gainer by whether its upper-cased exchange code qualifies.
///
/// Output has the same length and order as `gainers`. Duplicate codes are
/// kept as they are.
pub fn merge(gainers: &[GainerRecord], qualifying: &QualifyingSet) -> Vec<MergedRecord> {
    gainers
        .iter()
        .map(|gainer| {
            let tag = if qualifying.contains(&gainer.exchange_code) {
                LeverageTag::Qualifies
            } else {
                LeverageTag::DoesNotQualify
            };
            MergedRecord::new(gainer, tag)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qualifying() -> QualifyingSet {
        ["INFY", "WIPRO"].into_iter().collect()
    }

    #[test]
    fn test_merge_tags_and_preserves_order() {
        let gainers = vec![
            GainerRecord::new("Infosys Ltd", "INFY"),
            GainerRecord::new("Tata Consultancy", "TCS"),
        ];

        let merged = merge(&gainers, &qualifying());

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].display_name, "Infosys Ltd");
        assert_eq!(merged[0].leverage_tag, LeverageTag::Qualifies);
        assert_eq!(merged[1].exchange_code, "TCS");
        assert_eq!(merged[1].leverage_tag, LeverageTag::DoesNotQualify);
    }

    #[test]
    fn test_merge_is_case_insensitive() {
        let merged = merge(&[GainerRecord::new("Wipro", "wipro")], &qualifying());
        assert_eq!(merged[0].leverage_tag, LeverageTag::Qualifies);
        assert_eq!(merged[0].exchange_code, "wipro");
    }

    #[test]
    fn test_merge_keeps_duplicates() {
        let gainers = vec![
            GainerRecord::new("Infosys", "INFY"),
            GainerRecord::new("Infosys Ltd", "INFY"),
        ];
        let merged = merge(&gainers, &qualifying());
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|r| r.leverage_tag.qualifies()));
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge(&[], &qualifying()).is_empty());
        let merged = merge(&[GainerRecord::new("A", "A")], &QualifyingSet::new());
        assert_eq!(merged[0].leverage_tag, LeverageTag::DoesNotQualify);
    }
}
