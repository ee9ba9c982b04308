use crate::config::scenario::{ScenarioConfig, WeatherConfig};
use crate::core::simulation::Simulation;
use crate::domain::model::SimulationResult;
use crate::domain::ports::{Pipeline, Storage, Weather};
use crate::domain::weather::{ConstantWeather, WeatherSeries};
use crate::utils::error::{AirFlowError, Result};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

/// Runs one [`ScenarioConfig`]: weather is read from `input`, results are written to `output`.
pub struct ScenarioPipeline<S: Storage> {
    pub(crate) input: S,
    pub(crate) output: S,
    pub(crate) config: ScenarioConfig,
}

impl<S: Storage> ScenarioPipeline<S> {
    pub fn new(input: S, output: S, config: ScenarioConfig) -> Self {
        Self {
            input,
            output,
            config,
        }
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    fn output_files(&self, result: &SimulationResult) -> Vec<(String, Vec<u8>)> {
        let mut files = Vec::new();
        if self.config.writes("csv") {
            files.push((
                self.config.csv_filename().to_string(),
                result.csv_output.clone().into_bytes(),
            ));
        }
        if self.config.writes("json") {
            files.push((
                self.config.json_filename().to_string(),
                result.json_summary.clone().into_bytes(),
            ));
        }
        files
    }
}

fn zip_files(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, data) in files {
        zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
        zip.write_all(data)?;
    }
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for ScenarioPipeline<S> {
    async fn extract(&self) -> Result<Box<dyn Weather>> {
        match &self.config.weather {
            WeatherConfig::Csv { path } => {
                tracing::info!("🌦️ Reading weather from: {}", path);
                let data = self.input.read_file(path).await?;
                let series = WeatherSeries::from_bytes(&data)?;
                tracing::info!(
                    "📊 Weather has {} records, from {} to {}",
                    series.records().len(),
                    series.first_timestamp(),
                    series.last_timestamp()
                );
                Ok(Box::new(series))
            }
            WeatherConfig::Constant {
                dry_bulb_temperature,
                wind_speed,
                wind_direction,
            } => {
                tracing::info!(
                    "🌦️ Using constant weather: {}°C, wind {:?} m/s",
                    dry_bulb_temperature,
                    wind_speed
                );
                Ok(Box::new(ConstantWeather {
                    dry_bulb_temperature: Some(*dry_bulb_temperature),
                    wind_speed: *wind_speed,
                    wind_direction: *wind_direction,
                }))
            }
        }
    }

    async fn transform(&self, weather: Box<dyn Weather>) -> Result<SimulationResult> {
        let period = self.config.period(weather.time_range())?;
        let simulation = Simulation::new(self.config.building_model())?;

        tracing::info!(
            "🔧 Simulating '{}' from {} to {} every {} minutes",
            self.config.simulation.name,
            period.start,
            period.end,
            period.timestep.num_minutes()
        );

        // The simulation is CPU bound.
        tokio::task::spawn_blocking(move || simulation.run(weather.as_ref(), &period))
            .await
            .map_err(|e| AirFlowError::simulation(format!("Simulation task failed: {}", e)))?
    }

    async fn load(&self, result: SimulationResult) -> Result<String> {
        let files = self.output_files(&result);
        if files.is_empty() {
            tracing::warn!("No output formats selected, nothing to write");
            return Ok(self.config.output_path().to_string());
        }

        if let Some(compression) = self.config.compression() {
            tracing::debug!("Creating ZIP file with {} files", files.len());
            let zip_data = zip_files(&files)?;
            self.output
                .write_file(&compression.filename, &zip_data)
                .await?;

            let output_path = format!("{}/{}", self.config.output_path(), compression.filename);
            tracing::info!("📦 Results saved: {}", output_path);
            return Ok(output_path);
        }

        for (name, data) in &files {
            self.output.write_file(name, data).await?;
            tracing::debug!("Wrote {} ({} bytes)", name, data.len());
        }

        tracing::info!(
            "💾 {} result files saved to: {}",
            files.len(),
            self.config.output_path()
        );
        Ok(self.config.output_path().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                AirFlowError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    const SCENARIO: &str = r#"
[simulation]
name = "pipeline-test"
timestep_minutes = 60

[weather]
source = "csv"
path = "weather.csv"

[[spaces]]
name = "office"
volume = 100.0
dry_bulb_temperature = 2.0

[spaces.infiltration]
type = "doe2"
flow = 1.0

[output]
path = "results"
formats = ["csv", "json"]
"#;

    const WEATHER: &str = "\
timestamp,dry_bulb_temperature,wind_speed
2024-01-01 00:00,2.0,4.47
2024-01-01 02:00,2.0,4.47
";

    async fn pipeline(scenario: &str) -> (ScenarioPipeline<MockStorage>, MockStorage) {
        let input = MockStorage::default();
        input
            .write_file("weather.csv", WEATHER.as_bytes())
            .await
            .unwrap();
        let output = MockStorage::default();
        let config = ScenarioConfig::from_toml_str(scenario).unwrap();
        (ScenarioPipeline::new(input, output.clone(), config), output)
    }

    #[tokio::test]
    async fn test_extract_transform_load() {
        let (pipeline, output) = pipeline(SCENARIO).await;

        let weather = pipeline.extract().await.unwrap();
        let result = pipeline.transform(weather).await.unwrap();
        // The period defaults to the weather file range: 00:00, 01:00, 02:00.
        assert_eq!(result.records.len(), 3);
        for record in &result.records {
            assert!((record.infiltration_volume - 1.0).abs() < 0.02);
            assert_eq!(record.infiltration_temperature, 2.0);
        }

        let path = pipeline.load(result).await.unwrap();
        assert_eq!(path, "results");
        let csv = output.get_file("air_flow.csv").await.unwrap();
        assert_eq!(String::from_utf8(csv).unwrap().lines().count(), 4);
        assert!(output.get_file("air_flow_summary.json").await.is_some());
    }

    #[tokio::test]
    async fn test_missing_weather_file() {
        let scenario = SCENARIO.replace("weather.csv", "other.csv");
        let (pipeline, _) = pipeline(&scenario).await;
        assert!(matches!(
            pipeline.extract().await,
            Err(AirFlowError::IoError(_))
        ));
    }

    #[tokio::test]
    async fn test_compressed_output() {
        let scenario = format!(
            "{}\n[output.compression]\nenabled = true\nfilename = \"bundle.zip\"\n",
            SCENARIO
        );
        let (pipeline, output) = pipeline(&scenario).await;
        let weather = pipeline.extract().await.unwrap();
        let result = pipeline.transform(weather).await.unwrap();
        let path = pipeline.load(result).await.unwrap();

        assert_eq!(path, "results/bundle.zip");
        let zip_data = output.get_file("bundle.zip").await.unwrap();
        let archive = zip::ZipArchive::new(std::io::Cursor::new(zip_data)).unwrap();
        assert_eq!(archive.len(), 2);
        assert!(output.get_file("air_flow.csv").await.is_none());
    }
}
