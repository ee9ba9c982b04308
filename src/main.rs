use air_flow::config::scenario::WeatherConfig;
use air_flow::utils::error::ErrorSeverity;
use air_flow::utils::{logger, validation::Validate};
use air_flow::{CliConfig, LocalStorage, ScenarioConfig, ScenarioPipeline, SimulationEngine};
use clap::Parser;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliConfig::parse();

    if args.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("📁 Loading scenario from: {}", args.config);

    let mut config = match ScenarioConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load scenario file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };
    args.apply_overrides(&mut config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Scenario validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Scenario loaded and validated successfully");
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No simulation will run");
        return Ok(());
    }

    let monitor_enabled = args.monitor_enabled(&config);
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // Weather paths are relative to the scenario file.
    let scenario_dir = Path::new(&args.config)
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let input = LocalStorage::new(scenario_dir);
    let output = LocalStorage::new(config.output_path());
    let pipeline = ScenarioPipeline::new(input, output, config);
    let engine = SimulationEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Simulation completed successfully!");
            println!("✅ Simulation completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Simulation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &ScenarioConfig, args: &CliConfig) {
    println!("📋 Scenario Summary:");
    println!("  Name: {}", config.simulation.name);
    if let Some(description) = &config.simulation.description {
        println!("  Description: {}", description);
    }
    match &config.weather {
        WeatherConfig::Csv { path } => println!("  Weather: {}", path),
        WeatherConfig::Constant {
            dry_bulb_temperature,
            wind_speed,
            ..
        } => println!(
            "  Weather: constant {}°C, wind {} m/s",
            dry_bulb_temperature,
            wind_speed.map_or("-".to_string(), |w| w.to_string())
        ),
    }
    println!("  Timestep: {} minutes", config.timestep_minutes());
    println!(
        "  Buildings: {}, Spaces: {}",
        config.buildings.len(),
        config.spaces.len()
    );
    for space in &config.spaces {
        println!(
            "    - {}: infiltration {}, ventilation {}",
            space.name,
            space.infiltration.as_ref().map_or("none", infiltration_kind),
            space.ventilation.as_ref().map_or("none", ventilation_kind)
        );
    }
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output.formats.join(", "));
    if let Some(compression) = config.compression() {
        println!("  Compression: {} (ZIP)", compression.filename);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn infiltration_kind(infiltration: &air_flow::Infiltration) -> &'static str {
    use air_flow::Infiltration::*;
    match infiltration {
        Constant { .. } => "constant",
        Blast { .. } => "BLAST design flow rate",
        Doe2 { .. } => "DOE-2 design flow rate",
        DesignFlowRate { .. } => "design flow rate",
        EffectiveAirLeakageArea { .. } => "effective air leakage area",
        FlowCoefficient { .. } => "flow coefficient",
    }
}

fn ventilation_kind(ventilation: &air_flow::Ventilation) -> &'static str {
    match ventilation {
        air_flow::Ventilation::DesignFlowRate { .. } => "design flow rate",
        air_flow::Ventilation::WindAndStackOpenArea { .. } => "wind and stack open area",
    }
}
