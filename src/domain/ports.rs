use crate::domain::model::SimulationResult;
use crate::domain::weather::CurrentWeather;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// A source of outdoor conditions.
pub trait Weather: Send + Sync {
    fn get_weather_data(&self, date: NaiveDateTime) -> CurrentWeather;

    /// First and last dates with recorded data, if the source is bounded.
    fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        None
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Box<dyn Weather>>;
    async fn transform(&self, weather: Box<dyn Weather>) -> Result<SimulationResult>;
    async fn load(&self, result: SimulationResult) -> Result<String>;
}
