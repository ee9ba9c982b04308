pub mod air_flow_model;
pub mod engine;
pub mod eplus;
pub mod resolvers;
pub mod simulation;

pub use crate::domain::model::{AirFlowRecord, SimulationResult};
pub use crate::domain::ports::{Pipeline, Storage, Weather};
pub use crate::utils::error::Result;
