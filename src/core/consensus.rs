use crate::core::formula::dedup_preserving_order;
use std::collections::HashSet;

/// Concatenates suggestion lists, keeping the first occurrence of each formula.
pub fn merge_unique(lists: &[&[String]]) -> Vec<String> {
    dedup_preserving_order(lists.iter().flat_map(|list| list.iter().cloned()))
}

/// Formulas from `combined`, in its order, approved by every evaluator.
pub fn consensus(combined: &[String], approvals: &[&[String]]) -> Vec<String> {
    if approvals.is_empty() {
        return Vec::new();
    }

    let approval_sets: Vec<HashSet<&str>> = approvals
        .iter()
        .map(|list| list.iter().map(String::as_str).collect())
        .collect();

    combined
        .iter()
        .filter(|formula| approval_sets.iter().all(|set| set.contains(formula.as_str())))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_keeps_first_occurrence_order() {
        let a = list(&["ZnO", "TiO2", "SnO2"]);
        let b = list(&["In2O3", "ZnO", "Ga2O3"]);
        assert_eq!(
            merge_unique(&[a.as_slice(), b.as_slice()]),
            list(&["ZnO", "TiO2", "SnO2", "In2O3", "Ga2O3"])
        );
    }

    #[test]
    fn test_consensus_requires_every_approval() {
        let combined = list(&["ZnO", "TiO2", "SnO2", "In2O3"]);
        let first = list(&["In2O3", "ZnO", "SnO2"]);
        let second = list(&["SnO2", "ZnO", "CdO"]);

        assert_eq!(
            consensus(&combined, &[first.as_slice(), second.as_slice()]),
            list(&["ZnO", "SnO2"])
        );
    }

    #[test]
    fn test_consensus_ignores_formulas_outside_combined() {
        let combined = list(&["ZnO"]);
        let approved = list(&["ZnO", "CdO"]);
        assert_eq!(consensus(&combined, &[approved.as_slice(), approved.as_slice()]), list(&["ZnO"]));
    }

    #[test]
    fn test_empty_approval_empties_consensus() {
        let combined = list(&["ZnO", "TiO2"]);
        let approved = list(&["ZnO", "TiO2"]);
        let none: Vec<String> = Vec::new();
        assert!(consensus(&combined, &[approved.as_slice(), none.as_slice()]).is_empty());
        assert!(consensus(&combined, &[]).is_empty());
    }
}
