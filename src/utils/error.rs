use thiserror::Error;

#[derive(Error, Debug)]
pub enum AirFlowError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Weather data error: {message}")]
    WeatherError { message: String },

    #[error("{module}: {message}")]
    ModelError {
        module: &'static str,
        message: String,
    },

    #[error("Simulation state error: {message}")]
    StateError { message: String },

    #[error("Simulation error: {message}")]
    SimulationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Data,
    Configuration,
    Weather,
    Model,
    Simulation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Implemented by the simulation modules so their errors name the module.
pub trait ErrorHandling {
    fn module_name() -> &'static str;

    fn model_error(message: impl Into<String>) -> AirFlowError {
        AirFlowError::ModelError {
            module: Self::module_name(),
            message: message.into(),
        }
    }
}

impl AirFlowError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn weather(message: impl Into<String>) -> Self {
        Self::WeatherError {
            message: message.into(),
        }
    }

    pub fn simulation(message: impl Into<String>) -> Self {
        Self::SimulationError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ZipError(_) | Self::IoError(_) => ErrorCategory::Io,
            Self::CsvError(_) | Self::SerializationError(_) => ErrorCategory::Data,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
            Self::WeatherError { .. } => ErrorCategory::Weather,
            Self::ModelError { .. } => ErrorCategory::Model,
            Self::StateError { .. } | Self::SimulationError { .. } => ErrorCategory::Simulation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Io => ErrorSeverity::Critical,
            ErrorCategory::Data | ErrorCategory::Weather => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Model => ErrorSeverity::High,
            ErrorCategory::Simulation => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ZipError(_) => "Check that the output directory is writable, or disable output compression",
            Self::IoError(_) => "Check that the referenced files exist and the output directory is writable",
            Self::CsvError(_) => "Check the weather file: expected columns timestamp,dry_bulb_temperature,wind_speed,wind_direction",
            Self::SerializationError(_) => "Check the simulation results for non-finite values",
            Self::ConfigError { .. } | Self::ConfigValidationError { .. } => {
                "Review the scenario TOML file against the documented layout"
            }
            Self::MissingConfigError { .. } => "Add the missing field to the scenario TOML file",
            Self::InvalidConfigValueError { .. } => "Correct the offending value in the scenario TOML file",
            Self::WeatherError { .. } => {
                "Make sure the weather source provides dry bulb temperature and wind speed for the whole period"
            }
            Self::ModelError { .. } => {
                "Complete the building data (n_storeys, shelter_class or explicit coefficients) used by the spaces"
            }
            Self::StateError { .. } | Self::SimulationError { .. } => {
                "Check the simulation period and timestep"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Io => format!("Could not read or write files: {}", self),
            ErrorCategory::Data => format!("Input data could not be processed: {}", self),
            ErrorCategory::Configuration => format!("The scenario configuration is invalid: {}", self),
            ErrorCategory::Weather => format!("The weather data is incomplete: {}", self),
            ErrorCategory::Model => format!("The building model is incomplete: {}", self),
            ErrorCategory::Simulation => format!("The simulation could not run: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, AirFlowError>;
