use crate::core::simulation::SimulationPeriod;
use crate::domain::model::{Building, BuildingModel, Infiltration, Space, Ventilation};
use crate::domain::weather::parse_timestamp;
use crate::utils::error::{AirFlowError, Result};
use crate::utils::validation::{self, Validate};
use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TIMESTEP_MINUTES: i64 = 60;
pub const VALID_OUTPUT_FORMATS: [&str; 2] = ["csv", "json"];

/// A complete run: what to simulate, under which weather, and where results go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub simulation: SimulationConfig,
    pub weather: WeatherConfig,
    #[serde(default)]
    pub buildings: Vec<Building>,
    #[serde(default)]
    pub spaces: Vec<Space>,
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to the first weather record when the weather comes from a file.
    #[serde(default)]
    pub start: Option<String>,
    /// Defaults to the last weather record when the weather comes from a file.
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub timestep_minutes: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum WeatherConfig {
    /// A CSV time series, relative to the scenario file.
    Csv { path: String },
    Constant {
        dry_bulb_temperature: f64,
        #[serde(default)]
        wind_speed: Option<f64>,
        #[serde(default)]
        wind_direction: Option<f64>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
    pub compression: Option<CompressionConfig>,
    pub filenames: Option<FilenameConfig>,
}

fn default_formats() -> Vec<String> {
    vec!["csv".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilenameConfig {
    pub csv: Option<String>,
    pub json: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

impl ScenarioConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AirFlowError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AirFlowError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the value of the environment variable, leaving
    /// unknown variables untouched.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| AirFlowError::config(e.to_string()))?;

        let result = re.replace_all(content, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("simulation.name", &self.simulation.name)?;

        if let Some(timestep) = self.simulation.timestep_minutes {
            validation::validate_range("simulation.timestep_minutes", timestep, 1, 24 * 60)?;
        }
        let start = self.start()?;
        let end = self.end()?;
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(AirFlowError::InvalidConfigValueError {
                    field: "simulation.end".to_string(),
                    value: end.to_string(),
                    reason: format!("Must not be earlier than simulation.start ({})", start),
                });
            }
        }

        match &self.weather {
            WeatherConfig::Csv { path } => {
                validation::validate_path("weather.path", path)?;
                validation::validate_file_extension("weather.path", path, &["csv"])?;
            }
            WeatherConfig::Constant {
                wind_speed,
                wind_direction,
                ..
            } => {
                validation::validate_required_field("simulation.start", &self.simulation.start)?;
                validation::validate_required_field("simulation.end", &self.simulation.end)?;
                if let Some(wind_speed) = wind_speed {
                    validation::validate_non_negative("weather.wind_speed", *wind_speed)?;
                }
                if let Some(direction) = wind_direction {
                    validation::validate_range("weather.wind_direction", *direction, 0.0, 360.0)?;
                }
            }
        }

        validation::validate_unique_names(
            "buildings.name",
            self.buildings.iter().map(|b| b.name.as_str()),
        )?;
        for building in &self.buildings {
            if let Some(n_storeys) = building.n_storeys {
                validation::validate_positive_number(
                    &format!("buildings.{}.n_storeys", building.name),
                    n_storeys,
                    1,
                )?;
            }
        }
        validation::validate_unique_names("spaces.name", self.spaces.iter().map(|s| s.name.as_str()))?;
        for space in &self.spaces {
            self.validate_space(space)?;
        }

        validation::validate_path("output.path", &self.output.path)?;
        for format in &self.output.formats {
            if !VALID_OUTPUT_FORMATS.contains(&format.as_str()) {
                return Err(AirFlowError::InvalidConfigValueError {
                    field: "output.formats".to_string(),
                    value: format.clone(),
                    reason: format!(
                        "Unsupported format. Valid formats: {}",
                        VALID_OUTPUT_FORMATS.join(", ")
                    ),
                });
            }
        }
        if let Some(compression) = &self.output.compression {
            if compression.enabled {
                validation::validate_file_extension(
                    "output.compression.filename",
                    &compression.filename,
                    &["zip"],
                )?;
            }
        }

        Ok(())
    }

    fn validate_space(&self, space: &Space) -> Result<()> {
        validation::validate_non_empty_string("spaces.name", &space.name)?;
        let field = |name: &str| format!("spaces.{}.{}", space.name, name);

        if let Some(volume) = space.volume {
            validation::validate_non_negative(&field("volume"), volume)?;
        }
        if let Some(building) = &space.building {
            if !self.buildings.iter().any(|b| &b.name == building) {
                return Err(AirFlowError::InvalidConfigValueError {
                    field: field("building"),
                    value: building.clone(),
                    reason: "No building with this name".to_string(),
                });
            }
        }

        match &space.infiltration {
            Some(Infiltration::Constant { flow })
            | Some(Infiltration::Blast { flow })
            | Some(Infiltration::Doe2 { flow })
            | Some(Infiltration::DesignFlowRate { flow, .. }) => {
                validation::validate_non_negative(&field("infiltration.flow"), *flow)?
            }
            Some(Infiltration::EffectiveAirLeakageArea { area }) => {
                validation::validate_non_negative(&field("infiltration.area"), *area)?
            }
            Some(Infiltration::FlowCoefficient {
                flow_coefficient,
                pressure_exponent,
                shelter_factor,
                ..
            }) => {
                validation::validate_non_negative(
                    &field("infiltration.flow_coefficient"),
                    *flow_coefficient,
                )?;
                validation::validate_range(
                    &field("infiltration.pressure_exponent"),
                    *pressure_exponent,
                    0.5,
                    1.0,
                )?;
                validation::validate_range(&field("infiltration.shelter_factor"), *shelter_factor, 0.0, 1.0)?;
            }
            None => {}
        }

        match &space.ventilation {
            Some(Ventilation::DesignFlowRate { flow, .. }) => {
                validation::validate_non_negative(&field("ventilation.flow"), *flow)?
            }
            Some(Ventilation::WindAndStackOpenArea {
                opening_area,
                opening_effectiveness,
                ..
            }) => {
                validation::validate_non_negative(&field("ventilation.opening_area"), *opening_area)?;
                if let Some(cw) = opening_effectiveness {
                    validation::validate_range(&field("ventilation.opening_effectiveness"), *cw, 0.0, 1.0)?;
                }
            }
            None => {}
        }

        Ok(())
    }

    pub fn start(&self) -> Result<Option<NaiveDateTime>> {
        self.simulation.start.as_deref().map(parse_timestamp).transpose()
    }

    pub fn end(&self) -> Result<Option<NaiveDateTime>> {
        self.simulation.end.as_deref().map(parse_timestamp).transpose()
    }

    pub fn timestep_minutes(&self) -> i64 {
        self.simulation
            .timestep_minutes
            .unwrap_or(DEFAULT_TIMESTEP_MINUTES)
    }

    /// The configured period, with missing bounds taken from `weather_range`.
    pub fn period(
        &self,
        weather_range: Option<(NaiveDateTime, NaiveDateTime)>,
    ) -> Result<SimulationPeriod> {
        let start = match (self.start()?, weather_range) {
            (Some(start), _) => start,
            (None, Some((first, _))) => first,
            (None, None) => {
                return Err(AirFlowError::MissingConfigError {
                    field: "simulation.start".to_string(),
                })
            }
        };
        let end = match (self.end()?, weather_range) {
            (Some(end), _) => end,
            (None, Some((_, last))) => last,
            (None, None) => {
                return Err(AirFlowError::MissingConfigError {
                    field: "simulation.end".to_string(),
                })
            }
        };
        SimulationPeriod::new(start, end, self.timestep_minutes())
    }

    pub fn building_model(&self) -> BuildingModel {
        BuildingModel {
            buildings: self.buildings.clone(),
            spaces: self.spaces.clone(),
        }
    }

    pub fn output_path(&self) -> &str {
        &self.output.path
    }

    pub fn writes(&self, format: &str) -> bool {
        self.output.formats.iter().any(|f| f == format)
    }

    pub fn csv_filename(&self) -> &str {
        self.output
            .filenames
            .as_ref()
            .and_then(|f| f.csv.as_deref())
            .unwrap_or("air_flow.csv")
    }

    pub fn json_filename(&self) -> &str {
        self.output
            .filenames
            .as_ref()
            .and_then(|f| f.json.as_deref())
            .unwrap_or("air_flow_summary.json")
    }

    pub fn compression(&self) -> Option<&CompressionConfig> {
        self.output.compression.as_ref().filter(|c| c.enabled)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl Validate for ScenarioConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ShelterClass;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[simulation]
name = "test-house"
start = "2024-01-01 00:00"
end = "2024-01-01 23:00"
timestep_minutes = 30

[weather]
source = "constant"
dry_bulb_temperature = 2.0
wind_speed = 3.35

[[buildings]]
name = "house"
n_storeys = 2
shelter_class = "urban"

[[spaces]]
name = "living"
volume = 120.0
building = "house"
dry_bulb_temperature = 21.0

[spaces.infiltration]
type = "effective_air_leakage_area"
area = 250.0

[spaces.ventilation]
type = "design_flow_rate"
flow = 0.02
min_indoor_temperature = 18

[[spaces]]
name = "garage"

[spaces.infiltration]
type = "blast"
flow = 0.01

[output]
path = "./output"
formats = ["csv", "json"]
"#;

    #[test]
    fn test_parse_basic_scenario() {
        let config = ScenarioConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.simulation.name, "test-house");
        assert_eq!(config.timestep_minutes(), 30);
        assert_eq!(config.buildings[0].shelter_class, Some(ShelterClass::Urban));
        assert_eq!(
            config.spaces[0].infiltration,
            Some(Infiltration::EffectiveAirLeakageArea { area: 250.0 })
        );
        match &config.spaces[0].ventilation {
            Some(Ventilation::DesignFlowRate { flow, a, limits, .. }) => {
                assert_eq!(*flow, 0.02);
                assert_eq!(*a, 1.0);
                assert_eq!(limits.min_indoor_temperature, Some(18.0));
            }
            other => panic!("unexpected ventilation {:?}", other),
        }
        assert_eq!(config.spaces[1].dry_bulb_temperature, 20.0);
        assert!(config.validate().is_ok());
        assert!(config.writes("json"));
        assert_eq!(config.csv_filename(), "air_flow.csv");
    }

    #[test]
    fn test_period_from_config() {
        let config = ScenarioConfig::from_toml_str(BASIC).unwrap();
        let period = config.period(None).unwrap();
        assert_eq!(period.n_steps(), 47);
    }

    #[test]
    fn test_period_falls_back_to_weather_range() {
        let toml = BASIC
            .replace("start = \"2024-01-01 00:00\"\n", "")
            .replace("end = \"2024-01-01 23:00\"\n", "");
        let config = ScenarioConfig::from_toml_str(&toml).unwrap();
        assert!(config.period(None).is_err());
        // Constant weather has no range of its own, so both bounds are required.
        assert!(config.validate().is_err());

        let first = parse_timestamp("2024-02-01 00:00").unwrap();
        let last = parse_timestamp("2024-02-01 02:00").unwrap();
        let period = config.period(Some((first, last))).unwrap();
        assert_eq!(period.start, first);
        assert_eq!(period.n_steps(), 5);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("AIR_FLOW_TEST_OUTPUT", "/tmp/air-flow-results");

        let toml = BASIC.replace("./output", "${AIR_FLOW_TEST_OUTPUT}");
        let config = ScenarioConfig::from_toml_str(&toml).unwrap();
        assert_eq!(config.output_path(), "/tmp/air-flow-results");

        std::env::remove_var("AIR_FLOW_TEST_OUTPUT");
    }

    #[test]
    fn test_unknown_building_is_rejected() {
        let toml = BASIC.replace("building = \"house\"", "building = \"shed\"");
        let config = ScenarioConfig::from_toml_str(&toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("spaces.living.building"));
    }

    #[test]
    fn test_building_without_storeys_is_rejected() {
        let toml = BASIC.replace("n_storeys = 2", "n_storeys = 0");
        let config = ScenarioConfig::from_toml_str(&toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("buildings.house.n_storeys"));
    }

    #[test]
    fn test_invalid_format_is_rejected() {
        let toml = BASIC.replace("[\"csv\", \"json\"]", "[\"xlsx\"]");
        let config = ScenarioConfig::from_toml_str(&toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_flow_is_rejected() {
        let toml = BASIC.replace("flow = 0.01", "flow = -0.01");
        let config = ScenarioConfig::from_toml_str(&toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_infiltration_type_fails_to_parse() {
        let toml = BASIC.replace("type = \"blast\"", "type = \"magic\"");
        assert!(ScenarioConfig::from_toml_str(&toml).is_err());
    }

    #[test]
    fn test_csv_weather_source() {
        let toml = BASIC.replace(
            "source = \"constant\"\ndry_bulb_temperature = 2.0\nwind_speed = 3.35",
            "source = \"csv\"\npath = \"weather.txt\"",
        );
        let config = ScenarioConfig::from_toml_str(&toml).unwrap();
        assert_eq!(
            config.weather,
            WeatherConfig::Csv {
                path: "weather.txt".to_string()
            }
        );
        // Only .csv files are accepted.
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = ScenarioConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.spaces.len(), 2);
        assert_eq!(config.building_model().buildings.len(), 1);
    }
}
