use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Drives a [`Pipeline`] through extract, transform and load.
pub struct SimulationEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> SimulationEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting air-flow simulation");
        self.monitor.log_stats("Start");

        tracing::debug!("Extracting weather...");
        let weather = self.pipeline.extract().await?;
        self.monitor.log_stats("Extract");

        tracing::debug!("Simulating...");
        let result = self.pipeline.transform(weather).await?;
        tracing::info!("Computed {} air-flow records", result.records.len());
        self.monitor.log_stats("Transform");

        tracing::debug!("Saving results...");
        let output_path = self.pipeline.load(result).await?;
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
