use crate::domain::model::MaterialSummary;
use std::collections::HashSet;

/// Entries without a formation energy sort after every real value.
pub const MISSING_ENERGY: f64 = 9999.0;

pub fn energy_key(summary: &MaterialSummary) -> f64 {
    summary.formation_energy_per_atom.unwrap_or(MISSING_ENERGY)
}

/// The most stable entry; the earliest wins a tie.
pub fn best_entry(entries: Vec<MaterialSummary>) -> Option<MaterialSummary> {
    let mut best: Option<MaterialSummary> = None;
    for entry in entries {
        let better = match &best {
            Some(current) => energy_key(&entry) < energy_key(current),
            None => true,
        };
        if better {
            best = Some(entry);
        }
    }
    best
}

/// Stable ascending sort by formation energy, one entry per material id, at most `n`.
pub fn top_candidates(mut found: Vec<MaterialSummary>, n: usize) -> Vec<MaterialSummary> {
    found.sort_by(|a, b| energy_key(a).total_cmp(&energy_key(b)));

    let mut seen = HashSet::new();
    found
        .into_iter()
        .filter(|summary| seen.insert(summary.material_id.clone()))
        .take(n)
        .collect()
}
