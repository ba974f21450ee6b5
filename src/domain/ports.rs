use crate::config::ServiceSettings;
use crate::domain::model::{MaterialSummary, PredictionReport, Prompt, PromptStyle, Shortlist};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn design_goal(&self) -> &str;
    fn output_path(&self) -> &str;
    fn top_n(&self) -> usize;
    fn supercell(&self) -> [usize; 3];
    fn services(&self) -> ServiceSettings;
}

/// A hosted LLM that answers a prompt with free text.
#[async_trait]
pub trait FormulaAdvisor: Send + Sync {
    fn name(&self) -> &str;
    fn prompt_style(&self) -> PromptStyle;
    async fn complete(&self, prompt: &Prompt) -> Result<String>;
}

/// A materials database searchable by formula.
#[async_trait]
pub trait MaterialsDatabase: Send + Sync {
    async fn search_stable(&self, formula: &str) -> Result<Vec<MaterialSummary>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Shortlist>;
    async fn transform(&self, shortlist: Shortlist) -> Result<PredictionReport>;
    async fn load(&self, report: PredictionReport) -> Result<String>;
}
