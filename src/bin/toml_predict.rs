use anyhow::Context;
use clap::Parser;
use materials_predictor::core::prompts::run_preview;
use materials_predictor::core::ConfigProvider;
use materials_predictor::domain::model::Prompt;
use materials_predictor::utils::error::INVALID_CONFIG_EXIT_CODE;
use materials_predictor::utils::{logger, validation::Validate};
use materials_predictor::{LocalStorage, PredictionEngine, PredictionPipeline, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-predict")]
#[command(about = "Materials prediction driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "predictor.toml")]
    config: String,

    /// Override the design goal from the config
    #[arg(short, long)]
    goal: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Show the configuration and prompts without calling any service
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let dotenv_path = dotenvy::dotenv().ok();

    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    logger::init_logger(args.verbose, config.json_logs());
    tracing::info!("📁 Loaded configuration from: {}", args.config);
    if let Some(path) = &dotenv_path {
        tracing::info!("🔑 Loaded environment from {}", path.display());
    }

    if let Some(goal) = args.goal.clone() {
        tracing::info!("🔧 Design goal overridden to: {}", goal);
        config.run.goal = goal;
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(INVALID_CONFIG_EXIT_CODE);
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no requests will be sent");
        perform_dry_run(&config);
        return Ok(());
    }

    let credentials = config.credentials()?;
    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = PredictionPipeline::from_credentials(storage, config, &credentials)?;
    let engine = PredictionEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(outcome) => {
            if outcome.candidates.is_empty() {
                println!("No suitable material found.");
            }
            for candidate in &outcome.candidates {
                println!(
                    "  {}. {} ({})",
                    candidate.rank, candidate.summary.formula_pretty, candidate.summary.material_id
                );
            }
            println!("📁 Output saved to: {}", outcome.bundle_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Prediction run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    let services = config.services();
    let [na, nb, nc] = config.supercell();

    println!("📋 Configuration Summary:");
    println!("  Goal: {}", config.design_goal());
    println!("  LLM A: {} @ {}", services.openai.model, services.openai.endpoint);
    println!("  LLM B: {} @ {}", services.gemini.model, services.gemini.endpoint);
    println!("  Materials Project: {}", services.materials_project_endpoint);
    println!("  Top candidates: {}", config.top_n());
    println!("  Supercell: {}x{}x{}", na, nb, nc);
    println!("  Output: {}", config.output_path());
    println!(
        "  HTTP: timeout {}s, {} attempt(s)",
        services.http.timeout_seconds, services.http.retry_attempts
    );

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn print_prompt(label: &str, prompt: &Prompt) {
    println!("  {}:", label);
    if let Some(system) = &prompt.system {
        println!("    [system] {}", system);
    }
    for line in prompt.user.lines() {
        println!("    {}", line);
    }
}

fn perform_dry_run(config: &TomlConfig) {
    let goal = config.design_goal();
    let placeholder = vec!["<merged suggestions>".to_string()];

    println!("🔍 Dry Run Analysis:");
    println!();
    println!("🤖 Prompts:");
    for (label, prompt) in run_preview(goal, &placeholder) {
        print_prompt(label, &prompt);
    }

    println!();
    println!("🔑 Credentials:");
    match config.credentials() {
        Ok(_) => println!("  ✅ All API keys present"),
        Err(e) => println!("  ❌ {}", e.user_friendly_message()),
    }

    println!();
    println!("✅ Dry run complete. Use --verbose for more details during an actual run.");
}
