use crate::core::air_flow_model::AirFlowModel;
use crate::domain::model::{AirFlowRecord, BuildingModel, SimulationResult, SpaceSummary};
use crate::domain::ports::Weather;
use crate::domain::state::SimulationStateHeader;
use crate::utils::error::{AirFlowError, Result};
use chrono::{Duration, NaiveDateTime};

/// Timesteps from `start` to `end`, both included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationPeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub timestep: Duration,
}

impl SimulationPeriod {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, timestep_minutes: i64) -> Result<Self> {
        if timestep_minutes <= 0 {
            return Err(AirFlowError::simulation(format!(
                "Timestep must be positive, got {} minutes",
                timestep_minutes
            )));
        }
        if end < start {
            return Err(AirFlowError::simulation(format!(
                "Simulation ends ({}) before it starts ({})",
                end, start
            )));
        }
        let timestep = Duration::try_minutes(timestep_minutes).ok_or_else(|| {
            AirFlowError::simulation(format!(
                "Timestep of {} minutes is out of range",
                timestep_minutes
            ))
        })?;
        Ok(Self {
            start,
            end,
            timestep,
        })
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        std::iter::successors(Some(self.start), move |date| {
            let next = *date + self.timestep;
            (next <= self.end).then_some(next)
        })
    }

    pub fn n_steps(&self) -> usize {
        ((self.end - self.start).num_seconds() / self.timestep.num_seconds()) as usize + 1
    }
}

/// Runs an [`AirFlowModel`] over a period and collects its results.
#[derive(Debug)]
pub struct Simulation {
    model: BuildingModel,
    air_flow: AirFlowModel,
    header: SimulationStateHeader,
}

impl Simulation {
    pub fn new(model: BuildingModel) -> Result<Self> {
        let mut header = SimulationStateHeader::new();
        let air_flow = AirFlowModel::new(&model, &mut header)?;
        Ok(Self {
            model,
            air_flow,
            header,
        })
    }

    pub fn air_flow_model(&self) -> &AirFlowModel {
        &self.air_flow
    }

    pub fn run(&self, weather: &dyn Weather, period: &SimulationPeriod) -> Result<SimulationResult> {
        let mut state = self.header.take_values();
        let mut records = Vec::with_capacity(period.n_steps() * self.model.spaces.len());

        for date in period.dates() {
            self.air_flow.march(date, weather, &mut state)?;

            for (i, space) in self.model.spaces.iter().enumerate() {
                let infiltration_volume = self.air_flow.infiltration_volume(&state, i)?;
                let ventilation_volume = self.air_flow.ventilation_volume(&state, i)?;
                let air_changes_per_hour = space
                    .volume
                    .filter(|v| *v > 0.0)
                    .map(|v| (infiltration_volume + ventilation_volume) * 3600.0 / v);

                records.push(AirFlowRecord {
                    timestamp: date,
                    space: space.name.clone(),
                    infiltration_volume,
                    infiltration_temperature: self.air_flow.infiltration_temperature(&state, i)?,
                    ventilation_volume,
                    ventilation_temperature: self.air_flow.ventilation_temperature(&state, i)?,
                    air_changes_per_hour,
                });
            }
        }

        tracing::info!(
            "🌬️ Simulated {} timesteps for {} spaces",
            period.n_steps(),
            self.model.spaces.len()
        );

        let summaries = self.summarize(&records);
        Ok(SimulationResult {
            csv_output: render_csv(&records)?,
            json_summary: serde_json::to_string_pretty(&summaries)?,
            records,
            summaries,
        })
    }

    fn summarize(&self, records: &[AirFlowRecord]) -> Vec<SpaceSummary> {
        self.model
            .spaces
            .iter()
            .map(|space| {
                let rows: Vec<&AirFlowRecord> =
                    records.iter().filter(|r| r.space == space.name).collect();
                let n = rows.len().max(1) as f64;
                let mean = |f: fn(&AirFlowRecord) -> f64| rows.iter().map(|r| f(r)).sum::<f64>() / n;
                let max = |f: fn(&AirFlowRecord) -> f64| {
                    rows.iter().map(|r| f(r)).reduce(f64::max).unwrap_or(0.0)
                };
                let air_changes: Vec<f64> =
                    rows.iter().filter_map(|r| r.air_changes_per_hour).collect();

                SpaceSummary {
                    space: space.name.clone(),
                    mean_infiltration_volume: mean(|r| r.infiltration_volume),
                    max_infiltration_volume: max(|r| r.infiltration_volume),
                    mean_ventilation_volume: mean(|r| r.ventilation_volume),
                    max_ventilation_volume: max(|r| r.ventilation_volume),
                    mean_air_changes_per_hour: (!air_changes.is_empty())
                        .then(|| air_changes.iter().sum::<f64>() / air_changes.len() as f64),
                }
            })
            .collect()
    }
}

pub fn render_csv(records: &[AirFlowRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    let data = writer
        .into_inner()
        .map_err(|e| AirFlowError::IoError(e.into_error()))?;
    String::from_utf8(data).map_err(|e| AirFlowError::simulation(e.to_string()))
}
