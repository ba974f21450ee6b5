use crate::adapters::{GeminiClient, MaterialsProjectClient, OpenAiClient};
use crate::config::ApiCredentials;
use crate::core::consensus::{consensus, merge_unique};
use crate::core::export::{self, format_property};
use crate::core::formula::extract_formulas;
use crate::core::prompts::{evaluation_prompt, suggestion_prompt};
use crate::core::ranking::{best_entry, top_candidates};
use crate::core::viewer::render_page;
use crate::core::{
    ConfigProvider, FormulaAdvisor, MaterialsDatabase, Pipeline, PredictionReport, Shortlist,
    Storage,
};
use crate::domain::model::{LookupOutcome, MaterialSummary, Prompt, RankedCandidate};
use crate::utils::error::Result;
use crate::utils::validation::validate_design_goal;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const BUNDLE_FILENAME: &str = "prediction_bundle.zip";
pub const VIEWER_FILENAME: &str = "viewer.html";
pub const TABLE_FILENAME: &str = "top_candidates.csv";
pub const REPORT_FILENAME: &str = "report.json";

/// Two LLM advisors propose and vet formulas; a materials database confirms them.
pub struct PredictionPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    primary: Box<dyn FormulaAdvisor>,
    secondary: Box<dyn FormulaAdvisor>,
    database: Box<dyn MaterialsDatabase>,
}

impl<S: Storage, C: ConfigProvider> PredictionPipeline<S, C> {
    pub fn new(
        storage: S,
        config: C,
        primary: Box<dyn FormulaAdvisor>,
        secondary: Box<dyn FormulaAdvisor>,
        database: Box<dyn MaterialsDatabase>,
    ) -> Self {
        Self {
            storage,
            config,
            primary,
            secondary,
            database,
        }
    }

    /// OpenAI as the first advisor, Gemini as the second, Materials Project as the database.
    pub fn from_credentials(storage: S, config: C, credentials: &ApiCredentials) -> Result<Self> {
        let services = config.services();
        let primary = OpenAiClient::new(
            services.openai.clone(),
            services.http.clone(),
            credentials.openai.clone(),
        )?;
        let secondary = GeminiClient::new(
            services.gemini.clone(),
            services.http.clone(),
            credentials.gemini.clone(),
        )?;
        let database = MaterialsProjectClient::new(
            services.materials_project_endpoint.clone(),
            services.http.clone(),
            credentials.materials_project.clone(),
        )?;

        Ok(Self::new(
            storage,
            config,
            Box::new(primary),
            Box::new(secondary),
            Box::new(database),
        ))
    }

    /// A failing provider contributes an empty list instead of aborting the run.
    async fn ask(advisor: &dyn FormulaAdvisor, prompt: Prompt, stage: &str) -> Vec<String> {
        match advisor.complete(&prompt).await {
            Ok(reply) => {
                tracing::debug!("{} {} reply: {}", advisor.name(), stage, reply);
                let formulas = extract_formulas(&reply);
                if formulas.is_empty() {
                    tracing::warn!(
                        "⚠️ {} {} output had no usable formulas:\n{}",
                        advisor.name(),
                        stage,
                        reply
                    );
                }
                formulas
            }
            Err(e) => {
                tracing::error!("{} {} error: {}", advisor.name(), stage, e);
                Vec::new()
            }
        }
    }

    async fn suggest(advisor: &dyn FormulaAdvisor, goal: &str) -> Vec<String> {
        let prompt = suggestion_prompt(advisor.prompt_style(), goal);
        Self::ask(advisor, prompt, "suggestion").await
    }

    async fn evaluate(advisor: &dyn FormulaAdvisor, formulas: &[String], goal: &str) -> Vec<String> {
        let prompt = evaluation_prompt(advisor.prompt_style(), formulas, goal);
        Self::ask(advisor, prompt, "evaluation").await
    }

    async fn lookup(&self, formula: &str) -> (LookupOutcome, Option<MaterialSummary>) {
        tracing::info!("🔍 Searching Materials Project for `{}` ...", formula);
        let mut outcome = LookupOutcome {
            formula: formula.to_string(),
            material_id: None,
            formation_energy_per_atom: None,
            band_gap: None,
            error: None,
        };

        match self.database.search_stable(formula).await {
            Ok(entries) => match best_entry(entries) {
                Some(best) => {
                    tracing::info!(
                        "✅ Found: {} | E_f: {} eV/atom | Band Gap: {} eV",
                        best.formula_pretty,
                        format_property(best.formation_energy_per_atom),
                        format_property(best.band_gap)
                    );
                    outcome.material_id = Some(best.material_id.clone());
                    outcome.formation_energy_per_atom = best.formation_energy_per_atom;
                    outcome.band_gap = best.band_gap;
                    (outcome, Some(best))
                }
                None => {
                    tracing::warn!("🚫 No result found for {}", formula);
                    (outcome, None)
                }
            },
            Err(e) => {
                tracing::error!("🚫 MP query failed for {}: {}", formula, e);
                outcome.error = Some(e.to_string());
                (outcome, None)
            }
        }
    }

    fn build_candidate(rank: usize, summary: MaterialSummary, supercell: [usize; 3]) -> RankedCandidate {
        let expanded = summary.structure.as_ref().map(|s| s.supercell(supercell));
        let (cif, poscar) = match expanded {
            Some(Ok(big)) => {
                let cif = big
                    .to_cif(&summary.formula_pretty)
                    .map_err(|e| {
                        tracing::warn!("CIF export failed for {}: {}", summary.formula_pretty, e)
                    })
                    .ok();
                (cif, big.to_poscar(&summary.formula_pretty))
            }
            Some(Err(e)) => {
                tracing::warn!("Supercell failed for {}: {}", summary.formula_pretty, e);
                (None, None)
            }
            None => {
                tracing::warn!("No structure returned for {}", summary.material_id);
                (None, None)
            }
        };

        RankedCandidate {
            rank,
            summary,
            supercell,
            cif,
            poscar,
        }
    }

    fn bundle(&self, entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, data) in entries {
            // One archive entry per output file, stored under its relative path
            zip.start_file(name.as_str(), SimpleFileOptions::default())?;
            zip.write_all(data)?;
        }
        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for PredictionPipeline<S, C> {
    async fn extract(&self) -> Result<Shortlist> {
        let goal = self.config.design_goal().to_string();
        validate_design_goal(&goal)?;

        tracing::info!("🤖 Asking {} and {} for candidates", self.primary.name(), self.secondary.name());
        let (primary_suggestions, secondary_suggestions) = tokio::join!(
            Self::suggest(self.primary.as_ref(), &goal),
            Self::suggest(self.secondary.as_ref(), &goal)
        );
        tracing::info!("LLM A ({}) suggestions: {:?}", self.primary.name(), primary_suggestions);
        tracing::info!("LLM B ({}) suggestions: {:?}", self.secondary.name(), secondary_suggestions);

        let combined = merge_unique(&[
            primary_suggestions.as_slice(),
            secondary_suggestions.as_slice(),
        ]);

        let (primary_approved, secondary_approved) = if combined.is_empty() {
            tracing::warn!("Neither provider suggested a usable formula");
            (Vec::new(), Vec::new())
        } else {
            tracing::info!("Evaluating {} formulas for compliance...", combined.len());
            tokio::join!(
                Self::evaluate(self.primary.as_ref(), &combined, &goal),
                Self::evaluate(self.secondary.as_ref(), &combined, &goal)
            )
        };

        let approved = consensus(
            &combined,
            &[primary_approved.as_slice(), secondary_approved.as_slice()],
        );
        if approved.is_empty() {
            tracing::warn!("No materials passed both evaluations.");
        } else {
            tracing::info!("✅ High complying materials: {:?}", approved);
        }

        Ok(Shortlist {
            goal,
            primary_provider: self.primary.name().to_string(),
            secondary_provider: self.secondary.name().to_string(),
            primary_suggestions,
            secondary_suggestions,
            combined,
            primary_approved,
            secondary_approved,
            approved,
        })
    }

    async fn transform(&self, shortlist: Shortlist) -> Result<PredictionReport> {
        let mut lookups = Vec::with_capacity(shortlist.approved.len());
        let mut found = Vec::new();

        for formula in &shortlist.approved {
            let (outcome, best) = self.lookup(formula).await;
            lookups.push(outcome);
            found.extend(best);
        }

        let supercell = self.config.supercell();
        let candidates: Vec<RankedCandidate> = top_candidates(found, self.config.top_n())
            .into_iter()
            .enumerate()
            .map(|(index, summary)| Self::build_candidate(index + 1, summary, supercell))
            .collect();

        if candidates.is_empty() {
            tracing::warn!("No suitable material found.");
        } else {
            tracing::info!("🎯 Top {} candidates found", candidates.len());
        }

        Ok(PredictionReport {
            generated_at: chrono::Utc::now(),
            shortlist,
            lookups,
            candidates,
        })
    }

    async fn load(&self, report: PredictionReport) -> Result<String> {
        let output_path = format!("{}/{}", self.config.output_path(), BUNDLE_FILENAME);

        // Render every artifact up front
        let table = export::candidates_csv(&report.candidates)?;
        let page = render_page(&report).into_bytes();
        let structures: Vec<(String, Vec<u8>)> = export::structure_files(&report)
            .into_iter()
            .map(|(name, contents)| (name, contents.into_bytes()))
            .collect();

        let mut entries = vec![
            (TABLE_FILENAME.to_string(), table.clone()),
            (REPORT_FILENAME.to_string(), export::report_json(&report)?.into_bytes()),
            (VIEWER_FILENAME.to_string(), page.clone()),
        ];
        entries.extend(structures.iter().cloned());

        // Create ZIP bundle
        tracing::debug!("Creating ZIP bundle with {} files", entries.len());
        let zip_data = self.bundle(&entries)?;

        // Save bundle to storage
        self.storage.write_file(BUNDLE_FILENAME, &zip_data).await?;

        // Loose copies so the page's download links resolve next to it
        self.storage.write_file(VIEWER_FILENAME, &page).await?;
        self.storage.write_file(TABLE_FILENAME, &table).await?;
        for (name, data) in &structures {
            self.storage.write_file(name, data).await?;
        }

        tracing::debug!("Bundle saved ({} bytes)", zip_data.len());
        Ok(output_path)
    }
}
