use clap::Parser;
use materials_predictor::core::export::format_property;
use materials_predictor::domain::model::RunOutcome;
use materials_predictor::utils::error::{PredictionError, INVALID_CONFIG_EXIT_CODE};
use materials_predictor::utils::{logger, validation::Validate};
use materials_predictor::{
    ApiCredentials, CliConfig, LocalStorage, PredictionEngine, PredictionPipeline,
};

fn fail(e: PredictionError) -> ! {
    tracing::error!(
        "❌ Prediction run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

fn print_outcome(outcome: &RunOutcome) {
    if outcome.candidates.is_empty() {
        println!("No suitable material found.");
    } else {
        println!("🎯 Top {} candidates:", outcome.candidates.len());
        for candidate in &outcome.candidates {
            let summary = &candidate.summary;
            println!(
                "  {}. {} ({}) | E_f: {} eV/atom | Band Gap: {} eV",
                candidate.rank,
                summary.formula_pretty,
                summary.material_id,
                format_property(summary.formation_energy_per_atom),
                format_property(summary.band_gap)
            );
        }
    }
    println!("📁 Output saved to: {}", outcome.bundle_path);
}

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();
    let dotenv_path = match &config.env_file {
        Some(_) => None,
        None => dotenvy::dotenv().ok(),
    };

    logger::init_logger(config.verbose, config.json_logs);
    if let Some(path) = &dotenv_path {
        tracing::info!("🔑 Loaded environment from {}", path.display());
    }

    tracing::info!("Starting materials-predictor");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(INVALID_CONFIG_EXIT_CODE);
    }

    let credentials = match config.env_file.as_deref() {
        Some(path) => ApiCredentials::from_env_file(path),
        None => ApiCredentials::from_env(),
    };
    let credentials = match credentials {
        Ok(credentials) => credentials,
        Err(e) => fail(e),
    };

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = match PredictionPipeline::from_credentials(storage, config, &credentials) {
        Ok(pipeline) => pipeline,
        Err(e) => fail(e),
    };

    let engine = PredictionEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(outcome) => {
            tracing::info!("✅ Prediction run completed");
            print_outcome(&outcome);
        }
        Err(e) => fail(e),
    }
}
