use crate::domain::model::{PredictionReport, RankedCandidate};
use crate::utils::error::{PredictionError, Result};
use regex::Regex;
use std::sync::LazyLock;

pub const TABLE_HEADERS: [&str; 6] = [
    "#",
    "Formula",
    "MP ID",
    "Formation Energy (eV/atom)",
    "Band Gap (eV)",
    "Density (g/cm³)",
];

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("valid filename pattern"));

pub fn sanitize_filename(name: &str) -> String {
    UNSAFE_FILENAME_CHARS.replace_all(name, "_").into_owned()
}

pub fn format_property(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.3}", v))
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn table_row(candidate: &RankedCandidate) -> [String; 6] {
    let summary = &candidate.summary;
    [
        candidate.rank.to_string(),
        summary.formula_pretty.clone(),
        summary.material_id.clone(),
        format_property(summary.formation_energy_per_atom),
        format_property(summary.band_gap),
        format_property(summary.density),
    ]
}

pub fn candidates_csv(candidates: &[RankedCandidate]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(TABLE_HEADERS)?;
    for candidate in candidates {
        writer.write_record(table_row(candidate))?;
    }
    writer
        .into_inner()
        .map_err(|e| PredictionError::ProcessingError {
            message: format!("failed to finish CSV: {}", e),
        })
}

/// Download paths of one candidate's structure files, relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructurePaths {
    pub cif: String,
    pub poscar: String,
}

/// Paths for every candidate, in candidate order. A formula shared by
/// several candidates gets the material id appended to keep names unique.
pub fn structure_paths(candidates: &[RankedCandidate]) -> Vec<StructurePaths> {
    let stems: Vec<String> = candidates
        .iter()
        .map(|c| sanitize_filename(&c.summary.formula_pretty))
        .collect();

    candidates
        .iter()
        .zip(&stems)
        .map(|(candidate, stem)| {
            let shared = stems.iter().filter(|other| *other == stem).count() > 1;
            let stem = if shared {
                sanitize_filename(&format!("{}_{}", stem, candidate.summary.material_id))
            } else {
                stem.clone()
            };
            StructurePaths {
                cif: format!("structures/{}.cif", stem),
                poscar: format!("structures/{}_POSCAR.vasp", stem),
            }
        })
        .collect()
}

/// Every structure file of the report as (path, contents).
pub fn structure_files(report: &PredictionReport) -> Vec<(String, String)> {
    let mut files = Vec::new();
    for (candidate, paths) in report
        .candidates
        .iter()
        .zip(structure_paths(&report.candidates))
    {
        if let Some(cif) = &candidate.cif {
            files.push((paths.cif, cif.clone()));
        }
        if let Some(poscar) = &candidate.poscar {
            files.push((paths.poscar, poscar.clone()));
        }
    }
    files
}

pub fn report_json(report: &PredictionReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
