use crate::core::resolvers::{InfiltrationResolver, VentilationResolver};
use crate::domain::model::BuildingModel;
use crate::domain::ports::Weather;
use crate::domain::state::{SimulationState, SimulationStateElement, SimulationStateHeader};
use crate::utils::error::{AirFlowError, ErrorHandling, Result};
use chrono::NaiveDateTime;

/// Where one space's values live in the [`SimulationState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceStateIndices {
    pub dry_bulb_temperature: usize,
    pub infiltration_volume: usize,
    pub infiltration_temperature: usize,
    pub ventilation_volume: usize,
    pub ventilation_temperature: usize,
}

#[derive(Debug, Clone)]
struct SpaceAirFlow {
    name: String,
    indices: SpaceStateIndices,
    infiltration: Option<InfiltrationResolver>,
    ventilation: Option<VentilationResolver>,
}

/// Computes infiltration and ventilation for every space of a [`BuildingModel`].
#[derive(Debug, Clone)]
pub struct AirFlowModel {
    spaces: Vec<SpaceAirFlow>,
}

impl ErrorHandling for AirFlowModel {
    fn module_name() -> &'static str {
        "Air-flow model"
    }
}

impl AirFlowModel {
    /// Registers the per-space state elements and resolves every coefficient.
    ///
    /// A space dry bulb temperature already registered (e.g. by a thermal
    /// model) is reused rather than pushed again.
    pub fn new(model: &BuildingModel, state: &mut SimulationStateHeader) -> Result<Self> {
        let mut spaces = Vec::with_capacity(model.spaces.len());

        for (i, space) in model.spaces.iter().enumerate() {
            let temperature_element = SimulationStateElement::SpaceDryBulbTemperature(i);
            let dry_bulb_temperature = match state.index_of(temperature_element) {
                Some(index) => index,
                None => state.push(temperature_element, space.dry_bulb_temperature)?,
            };

            let indices = SpaceStateIndices {
                dry_bulb_temperature,
                infiltration_volume: state
                    .push(SimulationStateElement::SpaceInfiltrationVolume(i), 0.0)?,
                infiltration_temperature: state
                    .push(SimulationStateElement::SpaceInfiltrationTemperature(i), 0.0)?,
                ventilation_volume: state
                    .push(SimulationStateElement::SpaceVentilationVolume(i), 0.0)?,
                ventilation_temperature: state
                    .push(SimulationStateElement::SpaceVentilationTemperature(i), 0.0)?,
            };

            let infiltration = space
                .infiltration
                .as_ref()
                .map(|infiltration| InfiltrationResolver::new(space, infiltration, model))
                .transpose()
                .map_err(|e| Self::model_error(e.to_string()))?;
            let ventilation = space.ventilation.as_ref().map(VentilationResolver::new);

            if infiltration.is_none() && ventilation.is_none() {
                tracing::debug!("Space '{}' has no infiltration nor ventilation", space.name);
            }

            spaces.push(SpaceAirFlow {
                name: space.name.clone(),
                indices,
                infiltration,
                ventilation,
            });
        }

        tracing::debug!("Air-flow model ready for {} spaces", spaces.len());
        Ok(Self { spaces })
    }

    /// Updates infiltration and ventilation of every space for `date`.
    ///
    /// Incoming air is at the outdoor dry bulb temperature.
    pub fn march(
        &self,
        date: NaiveDateTime,
        weather: &dyn Weather,
        state: &mut SimulationState,
    ) -> Result<()> {
        let current_weather = weather.get_weather_data(date);
        let outdoor_temperature = current_weather.dry_bulb_temperature.ok_or_else(|| {
            AirFlowError::weather(format!("Weather does not have dry bulb temperature at {}", date))
        })?;

        for space in &self.spaces {
            let indices = space.indices;
            let t_space = Self::get(state, indices.dry_bulb_temperature)?;

            Self::set(state, indices.infiltration_temperature, outdoor_temperature)?;
            Self::set(state, indices.ventilation_temperature, outdoor_temperature)?;

            if let Some(resolver) = &space.infiltration {
                let volume = resolver
                    .resolve(&current_weather, t_space)
                    .map_err(|e| Self::space_error(&space.name, date, e))?;
                Self::set(state, indices.infiltration_volume, volume)?;
            }

            if let Some(resolver) = &space.ventilation {
                let volume = resolver
                    .resolve(&current_weather, t_space)
                    .map_err(|e| Self::space_error(&space.name, date, e))?;
                Self::set(state, indices.ventilation_volume, volume)?;
            }
        }

        Ok(())
    }

    fn space_error(space: &str, date: NaiveDateTime, e: AirFlowError) -> AirFlowError {
        match e {
            AirFlowError::WeatherError { message } => {
                AirFlowError::weather(format!("Space '{}' at {}: {}", space, date, message))
            }
            other => other,
        }
    }

    fn get(state: &SimulationState, index: usize) -> Result<f64> {
        state.get(index).copied().ok_or_else(|| AirFlowError::StateError {
            message: format!("Index {} is out of the simulation state", index),
        })
    }

    fn set(state: &mut SimulationState, index: usize, value: f64) -> Result<()> {
        let slot = state.get_mut(index).ok_or_else(|| AirFlowError::StateError {
            message: format!("Index {} is out of the simulation state", index),
        })?;
        *slot = value;
        Ok(())
    }

    fn indices(&self, space: usize) -> Result<SpaceStateIndices> {
        self.spaces
            .get(space)
            .map(|s| s.indices)
            .ok_or_else(|| Self::model_error(format!("There is no space with index {}", space)))
    }

    pub fn n_spaces(&self) -> usize {
        self.spaces.len()
    }

    pub fn space_name(&self, space: usize) -> Option<&str> {
        self.spaces.get(space).map(|s| s.name.as_str())
    }

    pub fn space_indices(&self, space: usize) -> Option<SpaceStateIndices> {
        self.spaces.get(space).map(|s| s.indices)
    }

    pub fn infiltration_volume(&self, state: &SimulationState, space: usize) -> Result<f64> {
        Self::get(state, self.indices(space)?.infiltration_volume)
    }

    pub fn infiltration_temperature(&self, state: &SimulationState, space: usize) -> Result<f64> {
        Self::get(state, self.indices(space)?.infiltration_temperature)
    }

    pub fn ventilation_volume(&self, state: &SimulationState, space: usize) -> Result<f64> {
        Self::get(state, self.indices(space)?.ventilation_volume)
    }

    pub fn ventilation_temperature(&self, state: &SimulationState, space: usize) -> Result<f64> {
        Self::get(state, self.indices(space)?.ventilation_temperature)
    }

    pub fn space_temperature(&self, state: &SimulationState, space: usize) -> Result<f64> {
        Self::get(state, self.indices(space)?.dry_bulb_temperature)
    }

    pub fn set_space_temperature(
        &self,
        state: &mut SimulationState,
        space: usize,
        temperature: f64,
    ) -> Result<()> {
        Self::set(state, self.indices(space)?.dry_bulb_temperature, temperature)
    }
}
