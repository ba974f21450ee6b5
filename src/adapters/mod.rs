// Adapters: concrete clients for the external services behind the domain ports.

pub mod gemini;
pub mod http;
pub mod materials_project;
pub mod openai;

pub use gemini::GeminiClient;
pub use materials_project::MaterialsProjectClient;
pub use openai::OpenAiClient;
