use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A text request sent to an LLM provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
}

impl Prompt {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            system: None,
            user: text.into(),
        }
    }

    pub fn with_system(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            user: user.into(),
        }
    }
}

/// Which prompt dialect a provider receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// System instruction plus a short user message.
    Chat,
    /// Everything in a single instruction.
    SingleTurn,
}

/// Output of the extract phase: what each provider proposed and approved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shortlist {
    pub goal: String,
    pub primary_provider: String,
    pub secondary_provider: String,
    pub primary_suggestions: Vec<String>,
    pub secondary_suggestions: Vec<String>,
    pub combined: Vec<String>,
    pub primary_approved: Vec<String>,
    pub secondary_approved: Vec<String>,
    pub approved: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub element: String,
    #[serde(default = "full_occupancy")]
    pub occu: f64,
}

fn full_occupancy() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub species: Vec<Species>,
    /// Fractional coordinates.
    pub abc: [f64; 3],
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    /// Lattice vectors as rows, in Å.
    pub matrix: [[f64; 3]; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub lattice: Lattice,
    pub sites: Vec<Site>,
}

/// One entry of the Materials Project summary endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSummary {
    pub material_id: String,
    pub formula_pretty: String,
    #[serde(default)]
    pub formation_energy_per_atom: Option<f64>,
    #[serde(default)]
    pub band_gap: Option<f64>,
    #[serde(default)]
    pub density: Option<f64>,
    #[serde(default)]
    pub structure: Option<Structure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupOutcome {
    pub formula: String,
    pub material_id: Option<String>,
    pub formation_energy_per_atom: Option<f64>,
    pub band_gap: Option<f64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub rank: usize,
    pub summary: MaterialSummary,
    pub supercell: [usize; 3],
    /// Written as separate files, not part of the JSON report.
    #[serde(skip)]
    pub cif: Option<String>,
    #[serde(skip)]
    pub poscar: Option<String>,
}

/// Output of the transform phase, consumed by load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionReport {
    pub generated_at: DateTime<Utc>,
    pub shortlist: Shortlist,
    pub lookups: Vec<LookupOutcome>,
    pub candidates: Vec<RankedCandidate>,
}

/// What the engine hands back to the binaries.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub bundle_path: String,
    pub approved: Vec<String>,
    pub candidates: Vec<RankedCandidate>,
}
