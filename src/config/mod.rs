#[cfg(feature = "cli")]
pub mod cli;
pub mod scenario;
pub mod storage;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use scenario::ScenarioConfig;
pub use storage::LocalStorage;
