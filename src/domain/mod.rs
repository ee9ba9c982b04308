// Domain layer: building and weather models, the simulation state and the ports.

pub mod model;
pub mod ports;
pub mod state;
pub mod weather;
