use crate::config::scenario::ScenarioConfig;
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "air-flow")]
#[command(about = "Infiltration and ventilation rates of building spaces")]
pub struct CliConfig {
    /// Path to the scenario TOML file
    #[arg(short, long, default_value = "scenario.toml")]
    pub config: String,

    /// Override the output directory of the scenario
    #[arg(long)]
    pub output_path: Option<String>,

    /// Override the simulation timestep, in minutes
    #[arg(long)]
    pub timestep_minutes: Option<i64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Log JSON lines instead of human-readable output
    #[arg(long)]
    pub json_logs: bool,

    /// Override the monitoring setting of the scenario
    #[arg(long)]
    pub monitor: Option<bool>,

    /// Validate the scenario and describe the run without simulating
    #[arg(long)]
    pub dry_run: bool,
}

impl CliConfig {
    /// Applies the command line overrides to a loaded scenario.
    pub fn apply_overrides(&self, scenario: &mut ScenarioConfig) {
        if let Some(output_path) = &self.output_path {
            tracing::info!("🔧 Output path overridden to: {}", output_path);
            scenario.output.path = output_path.clone();
        }
        if let Some(timestep) = self.timestep_minutes {
            tracing::info!("🔧 Timestep overridden to: {} minutes", timestep);
            scenario.simulation.timestep_minutes = Some(timestep);
        }
    }

    pub fn monitor_enabled(&self, scenario: &ScenarioConfig) -> bool {
        self.monitor
            .unwrap_or_else(|| scenario.monitoring_enabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
[simulation]
name = "cli"
start = "2024-01-01 00:00"
end = "2024-01-01 01:00"

[weather]
source = "constant"
dry_bulb_temperature = 0.0

[output]
path = "./output"

[monitoring]
enabled = true
"#;

    #[test]
    fn test_parse_arguments() {
        let cli = CliConfig::parse_from([
            "air-flow",
            "--config",
            "house.toml",
            "--output-path",
            "/tmp/out",
            "--timestep-minutes",
            "10",
            "--dry-run",
        ]);
        assert_eq!(cli.config, "house.toml");
        assert!(cli.dry_run);
        assert!(!cli.verbose);

        let mut scenario = ScenarioConfig::from_toml_str(SCENARIO).unwrap();
        cli.apply_overrides(&mut scenario);
        assert_eq!(scenario.output_path(), "/tmp/out");
        assert_eq!(scenario.timestep_minutes(), 10);
        assert!(cli.monitor_enabled(&scenario));
    }

    #[test]
    fn test_monitor_flag_wins() {
        let cli = CliConfig::parse_from(["air-flow", "--monitor", "false"]);
        let scenario = ScenarioConfig::from_toml_str(SCENARIO).unwrap();
        assert!(!cli.monitor_enabled(&scenario));
        assert_eq!(cli.config, "scenario.toml");
    }
}
