use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Terrain around a building, as used by the Sherman-Grimsrud wind coefficient tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShelterClass {
    /// No obstructions or local shielding.
    NoObstructions,
    /// Typical shelter for an isolated rural house.
    IsolatedRural,
    /// Typical shelter caused by other buildings across the street.
    Urban,
    /// Typical shelter for urban buildings on larger lots.
    LargeLotUrban,
    /// Typical shelter produced by buildings immediately adjacent.
    SmallLotUrban,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub name: String,
    #[serde(default)]
    pub n_storeys: Option<usize>,
    #[serde(default)]
    pub shelter_class: Option<ShelterClass>,
    /// Overrides the storey-based stack coefficient, in (L/s)²/(cm⁴·K).
    #[serde(default)]
    pub stack_coefficient: Option<f64>,
    /// Overrides the shelter-based wind coefficient, in (L/s)²/(cm⁴·(m/s)²).
    #[serde(default)]
    pub wind_coefficient: Option<f64>,
}

impl Building {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            n_storeys: None,
            shelter_class: None,
            stack_coefficient: None,
            wind_coefficient: None,
        }
    }
}

/// How outdoor air leaks into a space. Flows are in m³/s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Infiltration {
    Constant {
        flow: f64,
    },
    /// Design flow rate with the BLAST default coefficients.
    Blast {
        flow: f64,
    },
    /// Design flow rate with the DOE-2 default coefficients.
    Doe2 {
        flow: f64,
    },
    DesignFlowRate {
        flow: f64,
        a: f64,
        b: f64,
        c: f64,
        d: f64,
    },
    /// Sherman-Grimsrud model; `area` is the effective leakage area in cm².
    EffectiveAirLeakageArea {
        area: f64,
    },
    /// AIM-2 model (Walker and Wilson).
    FlowCoefficient {
        flow_coefficient: f64,
        pressure_exponent: f64,
        stack_coefficient: f64,
        wind_coefficient: f64,
        shelter_factor: f64,
    },
}

/// Temperature conditions outside of which ventilation is shut off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VentilationLimits {
    #[serde(default)]
    pub min_indoor_temperature: Option<f64>,
    #[serde(default)]
    pub max_indoor_temperature: Option<f64>,
    #[serde(default)]
    pub min_outdoor_temperature: Option<f64>,
    #[serde(default)]
    pub max_outdoor_temperature: Option<f64>,
    /// Minimum indoor minus outdoor temperature difference.
    #[serde(default)]
    pub delta_temperature: Option<f64>,
}

impl VentilationLimits {
    pub fn allows(&self, t_space: f64, t_out: f64) -> bool {
        let above = |limit: Option<f64>, value: f64| limit.map_or(true, |l| value >= l);
        let below = |limit: Option<f64>, value: f64| limit.map_or(true, |l| value <= l);

        above(self.min_indoor_temperature, t_space)
            && below(self.max_indoor_temperature, t_space)
            && above(self.min_outdoor_temperature, t_out)
            && below(self.max_outdoor_temperature, t_out)
            && above(self.delta_temperature, t_space - t_out)
    }
}

/// Intentional outdoor air supplied to a space. Flows are in m³/s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Ventilation {
    DesignFlowRate {
        flow: f64,
        #[serde(default = "one")]
        a: f64,
        #[serde(default)]
        b: f64,
        #[serde(default)]
        c: f64,
        #[serde(default)]
        d: f64,
        #[serde(flatten)]
        limits: VentilationLimits,
    },
    /// Natural ventilation through an opening, driven by wind and buoyancy.
    WindAndStackOpenArea {
        /// m²
        opening_area: f64,
        /// Computed from the wind direction when absent.
        #[serde(default)]
        opening_effectiveness: Option<f64>,
        /// Degrees from north of the opening's outward normal.
        #[serde(default)]
        effective_angle: f64,
        /// Height between the opening midpoint and the neutral pressure level, m.
        #[serde(default)]
        height_difference: f64,
        /// Computed from the temperature difference when absent.
        #[serde(default)]
        discharge_coefficient: Option<f64>,
        #[serde(flatten)]
        limits: VentilationLimits,
    },
}

fn one() -> f64 {
    1.0
}

pub const DEFAULT_SPACE_TEMPERATURE: f64 = 20.0;

fn default_space_temperature() -> f64 {
    DEFAULT_SPACE_TEMPERATURE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Space {
    pub name: String,
    /// m³
    #[serde(default)]
    pub volume: Option<f64>,
    /// Name of the building this space belongs to.
    #[serde(default)]
    pub building: Option<String>,
    #[serde(default)]
    pub infiltration: Option<Infiltration>,
    #[serde(default)]
    pub ventilation: Option<Ventilation>,
    /// Indoor air temperature (°C) the space starts with.
    #[serde(default = "default_space_temperature")]
    pub dry_bulb_temperature: f64,
}

impl Space {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            volume: None,
            building: None,
            infiltration: None,
            ventilation: None,
            dry_bulb_temperature: DEFAULT_SPACE_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingModel {
    #[serde(default)]
    pub buildings: Vec<Building>,
    #[serde(default)]
    pub spaces: Vec<Space>,
}

impl BuildingModel {
    pub fn building(&self, name: &str) -> Option<&Building> {
        self.buildings.iter().find(|b| b.name == name)
    }
}

/// One timestep of results for one space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirFlowRecord {
    pub timestamp: NaiveDateTime,
    pub space: String,
    pub infiltration_volume: f64,
    pub infiltration_temperature: f64,
    pub ventilation_volume: f64,
    pub ventilation_temperature: f64,
    pub air_changes_per_hour: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceSummary {
    pub space: String,
    pub mean_infiltration_volume: f64,
    pub max_infiltration_volume: f64,
    pub mean_ventilation_volume: f64,
    pub max_ventilation_volume: f64,
    pub mean_air_changes_per_hour: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub records: Vec<AirFlowRecord>,
    pub summaries: Vec<SpaceSummary>,
    pub csv_output: String,
    pub json_summary: String,
}
