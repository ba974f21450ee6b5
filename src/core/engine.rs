use crate::core::Pipeline;
use crate::domain::model::RunOutcome;
use crate::utils::error::Result;
use crate::utils::monitor::PhaseMonitor;

/// Drives a pipeline through extract, transform and load.
pub struct PredictionEngine<P: Pipeline> {
    pipeline: P,
    monitor: PhaseMonitor,
}

impl<P: Pipeline> PredictionEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: PhaseMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        tracing::info!("Starting prediction run");

        tracing::info!("🤖 Generating and evaluating suggestions...");
        let shortlist = self.pipeline.extract().await?;
        tracing::info!(
            "{} of {} suggested formulas passed both evaluations",
            shortlist.approved.len(),
            shortlist.combined.len()
        );
        self.monitor.finish_phase("extract");

        tracing::info!("🔍 Finding best candidates...");
        let report = self.pipeline.transform(shortlist).await?;
        tracing::info!("Ranked {} candidates", report.candidates.len());
        self.monitor.finish_phase("transform");

        let approved = report.shortlist.approved.clone();
        let candidates = report.candidates.clone();

        tracing::info!("Writing results...");
        let bundle_path = self.pipeline.load(report).await?;
        tracing::info!("Output saved to: {}", bundle_path);
        self.monitor.finish_phase("load");

        if self.monitor.is_enabled() {
            let summary: Vec<String> = self
                .monitor
                .phases()
                .iter()
                .map(|timing| format!("{} {:.2?}", timing.phase, timing.elapsed))
                .collect();
            tracing::info!("⏱️ Phase timings: {}", summary.join(", "));
            self.monitor.log_final_stats();
        }

        Ok(RunOutcome {
            bundle_path,
            approved,
            candidates,
        })
    }
}
