pub mod scenario_pipeline;

pub use scenario_pipeline::ScenarioPipeline;
