use crate::utils::error::{AirFlowError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Values shared between simulation modules, addressed by index.
pub type SimulationState = Vec<f64>;

/// What a slot of the [`SimulationState`] holds. The `usize` is the space index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimulationStateElement {
    SpaceDryBulbTemperature(usize),
    SpaceInfiltrationVolume(usize),
    SpaceInfiltrationTemperature(usize),
    SpaceVentilationVolume(usize),
    SpaceVentilationTemperature(usize),
}

impl fmt::Display for SimulationStateElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpaceDryBulbTemperature(i) => write!(f, "Space {} Dry Bulb Temperature", i),
            Self::SpaceInfiltrationVolume(i) => write!(f, "Space {} Infiltration Volume", i),
            Self::SpaceInfiltrationTemperature(i) => {
                write!(f, "Space {} Infiltration Temperature", i)
            }
            Self::SpaceVentilationVolume(i) => write!(f, "Space {} Ventilation Volume", i),
            Self::SpaceVentilationTemperature(i) => {
                write!(f, "Space {} Ventilation Temperature", i)
            }
        }
    }
}

/// Describes the layout of a [`SimulationState`] while modules register what they need.
#[derive(Debug, Clone, Default)]
pub struct SimulationStateHeader {
    elements: Vec<SimulationStateElement>,
    initial_values: Vec<f64>,
}

impl SimulationStateHeader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `element` and returns its index in the state.
    pub fn push(&mut self, element: SimulationStateElement, initial_value: f64) -> Result<usize> {
        if self.index_of(element).is_some() {
            return Err(AirFlowError::StateError {
                message: format!("'{}' is already part of the simulation state", element),
            });
        }
        self.elements.push(element);
        self.initial_values.push(initial_value);
        Ok(self.elements.len() - 1)
    }

    pub fn index_of(&self, element: SimulationStateElement) -> Option<usize> {
        self.elements.iter().position(|e| *e == element)
    }

    pub fn elements(&self) -> &[SimulationStateElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Builds a state filled with the registered initial values.
    pub fn take_values(&self) -> SimulationState {
        self.initial_values.clone()
    }
}
