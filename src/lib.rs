//! Infiltration and ventilation of building spaces, following the EnergyPlus
//! Engineering Reference.
//!
//! [`AirFlowModel`] can be driven directly by another simulation sharing the
//! [`SimulationState`](domain::state::SimulationState), or through a
//! [`ScenarioPipeline`] run by the [`SimulationEngine`].

pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{LocalStorage, ScenarioConfig};

pub use app::pipelines::ScenarioPipeline;
pub use core::{
    air_flow_model::AirFlowModel,
    engine::SimulationEngine,
    simulation::{Simulation, SimulationPeriod},
};
pub use domain::model::{Building, BuildingModel, Infiltration, ShelterClass, Space, Ventilation};
pub use domain::weather::{ConstantWeather, CurrentWeather, WeatherSeries};
pub use utils::error::{AirFlowError, Result};
