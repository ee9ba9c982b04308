use crate::core::eplus::*;
use crate::domain::model::{
    Building, BuildingModel, Infiltration, ShelterClass, Space, Ventilation, VentilationLimits,
};
use crate::domain::weather::CurrentWeather;
use crate::utils::error::{AirFlowError, Result};

/// Sherman-Grimsrud stack coefficient from the number of storeys.
pub fn resolve_stack_coefficient(space: &Space, building: &Building) -> Result<f64> {
    if let Some(cs) = building.stack_coefficient {
        return Ok(cs);
    }

    let n_storeys = building.n_storeys.ok_or_else(|| {
        AirFlowError::config(format!(
            "Space '{}' has been assigned an effective air leakage area infiltration but its building '{}' has not enough data. Please assign values to the Building's stack_coefficient or n_storeys fields",
            space.name, building.name
        ))
    })?;

    match n_storeys {
        0 => Err(AirFlowError::config(format!(
            "Building '{}' has 0 storeys",
            building.name
        ))),
        1 => Ok(0.000145),
        2 => Ok(0.000290),
        3 => Ok(0.000435),
        _ => {
            tracing::warn!(
                "The effective air leakage area infiltration (used in Space '{}') is appropriate for buildings of up to about 3 storeys; Building '{}' has {}",
                space.name,
                building.name,
                n_storeys
            );
            Ok(0.000435)
        }
    }
}

/// Sherman-Grimsrud wind coefficient from the shelter class and the number of storeys.
pub fn resolve_wind_coefficient(space: &Space, building: &Building) -> Result<f64> {
    if let Some(cw) = building.wind_coefficient {
        return Ok(cw);
    }

    let n_storeys = building.n_storeys.ok_or_else(|| {
        AirFlowError::config(format!(
            "Building '{}', associated with Space '{}', has not been assigned an n_storeys field. Cannot resolve the wind coefficient for effective air leakage area infiltration",
            building.name, space.name
        ))
    })?;

    let shelter_class = building.shelter_class.ok_or_else(|| {
        AirFlowError::config(format!(
            "Space '{}' has been assigned an effective air leakage area infiltration but its building '{}' has not enough data. Please assign values to the Building's wind_coefficient or shelter_class and n_storeys fields",
            space.name, building.name
        ))
    })?;

    if n_storeys == 0 {
        return Err(AirFlowError::config(format!(
            "Building '{}' has 0 storeys",
            building.name
        )));
    }

    let by_storeys = |one: f64, two: f64, more: f64| match n_storeys {
        1 => one,
        2 => two,
        _ => more,
    };

    Ok(match shelter_class {
        ShelterClass::NoObstructions => by_storeys(0.000319, 0.000420, 0.000494),
        ShelterClass::IsolatedRural => by_storeys(0.000246, 0.000325, 0.000382),
        ShelterClass::Urban => by_storeys(0.000172, 0.000231, 0.000271),
        ShelterClass::LargeLotUrban => by_storeys(0.000104, 0.000137, 0.000161),
        ShelterClass::SmallLotUrban => by_storeys(0.000032, 0.000042, 0.000049),
    })
}

fn outdoor_temperature(weather: &CurrentWeather) -> Result<f64> {
    weather
        .dry_bulb_temperature
        .ok_or_else(|| AirFlowError::weather("Weather does not have dry bulb temperature"))
}

fn wind_speed(weather: &CurrentWeather) -> Result<f64> {
    weather
        .wind_speed
        .ok_or_else(|| AirFlowError::weather("Weather does not have wind speed"))
}

/// Infiltration of one space with every coefficient already known.
#[derive(Debug, Clone, PartialEq)]
pub enum InfiltrationResolver {
    Constant(f64),
    DesignFlowRate {
        design_rate: f64,
        coefficients: [f64; 4],
    },
    EffectiveLeakageArea {
        area: f64,
        cw: f64,
        cs: f64,
    },
    FlowCoefficient {
        c: f64,
        n: f64,
        cs: f64,
        cw: f64,
        shelter_factor: f64,
    },
}

impl InfiltrationResolver {
    pub fn new(space: &Space, infiltration: &Infiltration, model: &BuildingModel) -> Result<Self> {
        let resolver = match infiltration {
            Infiltration::Constant { flow } => Self::Constant(*flow),
            Infiltration::Blast { flow } => Self::DesignFlowRate {
                design_rate: *flow,
                coefficients: BLAST_COEFFICIENTS,
            },
            Infiltration::Doe2 { flow } => Self::DesignFlowRate {
                design_rate: *flow,
                coefficients: DOE2_COEFFICIENTS,
            },
            Infiltration::DesignFlowRate { flow, a, b, c, d } => Self::DesignFlowRate {
                design_rate: *flow,
                coefficients: [*a, *b, *c, *d],
            },
            Infiltration::EffectiveAirLeakageArea { area } => {
                let name = space.building.as_deref().ok_or_else(|| {
                    AirFlowError::config(format!(
                        "Space '{}' has been assigned an effective air leakage area infiltration but no building. Assign a Building to it",
                        space.name
                    ))
                })?;
                let building = model.building(name).ok_or_else(|| {
                    AirFlowError::config(format!(
                        "Space '{}' is assigned to Building '{}', which does not exist",
                        space.name, name
                    ))
                })?;
                Self::EffectiveLeakageArea {
                    area: *area,
                    cs: resolve_stack_coefficient(space, building)?,
                    cw: resolve_wind_coefficient(space, building)?,
                }
            }
            Infiltration::FlowCoefficient {
                flow_coefficient,
                pressure_exponent,
                stack_coefficient,
                wind_coefficient,
                shelter_factor,
            } => Self::FlowCoefficient {
                c: *flow_coefficient,
                n: *pressure_exponent,
                cs: *stack_coefficient,
                cw: *wind_coefficient,
                shelter_factor: *shelter_factor,
            },
        };
        Ok(resolver)
    }

    /// Infiltration flow (m³/s) for the given weather and indoor temperature.
    ///
    /// Leakage models treat a missing wind speed as calm air. Design flow rates
    /// never go below zero.
    pub fn resolve(&self, weather: &CurrentWeather, t_space: f64) -> Result<f64> {
        let flow = match self {
            Self::Constant(flow) => *flow,
            Self::DesignFlowRate {
                design_rate,
                coefficients: [a, b, c, d],
            } => design_flow_rate(
                *design_rate,
                *a,
                *b,
                *c,
                *d,
                t_space,
                outdoor_temperature(weather)?,
                wind_speed(weather)?,
            )
            .max(0.0),
            Self::EffectiveLeakageArea { area, cw, cs } => effective_leakage_area(
                *area,
                *cw,
                *cs,
                t_space,
                outdoor_temperature(weather)?,
                weather.wind_speed.unwrap_or(0.0),
            ),
            Self::FlowCoefficient {
                c,
                n,
                cs,
                cw,
                shelter_factor,
            } => flow_coefficient(
                *c,
                *n,
                *cs,
                *cw,
                *shelter_factor,
                t_space,
                outdoor_temperature(weather)?,
                weather.wind_speed.unwrap_or(0.0),
            ),
        };
        Ok(flow)
    }
}

/// Ventilation of one space with every coefficient already known.
#[derive(Debug, Clone, PartialEq)]
pub enum VentilationResolver {
    DesignFlowRate {
        design_rate: f64,
        coefficients: [f64; 4],
        limits: VentilationLimits,
    },
    WindAndStack {
        opening_area: f64,
        opening_effectiveness: Option<f64>,
        effective_angle: f64,
        height_difference: f64,
        discharge_coefficient: Option<f64>,
        limits: VentilationLimits,
    },
}

impl VentilationResolver {
    pub fn new(ventilation: &Ventilation) -> Self {
        match ventilation.clone() {
            Ventilation::DesignFlowRate {
                flow,
                a,
                b,
                c,
                d,
                limits,
            } => Self::DesignFlowRate {
                design_rate: flow,
                coefficients: [a, b, c, d],
                limits,
            },
            Ventilation::WindAndStackOpenArea {
                opening_area,
                opening_effectiveness,
                effective_angle,
                height_difference,
                discharge_coefficient,
                limits,
            } => Self::WindAndStack {
                opening_area,
                opening_effectiveness,
                effective_angle,
                height_difference,
                discharge_coefficient,
                limits,
            },
        }
    }

    fn limits(&self) -> &VentilationLimits {
        match self {
            Self::DesignFlowRate { limits, .. } | Self::WindAndStack { limits, .. } => limits,
        }
    }

    /// Ventilation flow (m³/s); zero whenever the temperature limits are not met
    /// or the design flow rate comes out negative.
    pub fn resolve(&self, weather: &CurrentWeather, t_space: f64) -> Result<f64> {
        let t_out = outdoor_temperature(weather)?;
        if !self.limits().allows(t_space, t_out) {
            return Ok(0.0);
        }

        let flow = match self {
            Self::DesignFlowRate {
                design_rate,
                coefficients: [a, b, c, d],
                ..
            } => design_flow_rate(
                *design_rate,
                *a,
                *b,
                *c,
                *d,
                t_space,
                t_out,
                wind_speed(weather)?,
            )
            .max(0.0),
            Self::WindAndStack {
                opening_area,
                opening_effectiveness,
                effective_angle,
                height_difference,
                discharge_coefficient,
                ..
            } => {
                let wind = weather.wind_speed.unwrap_or(0.0);
                let cw = match opening_effectiveness {
                    Some(cw) => *cw,
                    None => {
                        let direction = weather.wind_direction.ok_or_else(|| {
                            AirFlowError::weather(
                                "Weather does not have wind direction, needed to compute the opening effectiveness",
                            )
                        })?;
                        auto_opening_effectiveness(*effective_angle, direction)
                    }
                };
                let cd = discharge_coefficient
                    .unwrap_or_else(|| auto_discharge_coefficient(t_space, t_out));

                wind_and_stack_flow(
                    wind_driven_flow(cw, *opening_area, wind),
                    stack_driven_flow(cd, *opening_area, *height_difference, t_space, t_out),
                )
            }
        };
        Ok(flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn building(n_storeys: Option<usize>, shelter_class: Option<ShelterClass>) -> Building {
        Building {
            n_storeys,
            shelter_class,
            ..Building::new("house")
        }
    }

    fn weather(t_out: f64, wind: f64) -> CurrentWeather {
        CurrentWeather {
            dry_bulb_temperature: Some(t_out),
            wind_speed: Some(wind),
            wind_direction: None,
        }
    }

    #[test]
    fn test_stack_coefficient_by_storeys() {
        let space = Space::new("room");
        for (storeys, expected) in [(1, 0.000145), (2, 0.000290), (3, 0.000435), (5, 0.000435)] {
            let cs = resolve_stack_coefficient(&space, &building(Some(storeys), None)).unwrap();
            assert_eq!(cs, expected);
        }
    }

    #[test]
    fn test_stack_coefficient_errors() {
        let space = Space::new("room");
        let err = resolve_stack_coefficient(&space, &building(Some(0), None)).unwrap_err();
        assert!(err.to_string().contains("0 storeys"));
        assert!(resolve_stack_coefficient(&space, &building(None, None)).is_err());
    }

    #[test]
    fn test_explicit_coefficients_win() {
        let space = Space::new("room");
        let b = Building {
            stack_coefficient: Some(0.001),
            wind_coefficient: Some(0.002),
            ..Building::new("custom")
        };
        assert_eq!(resolve_stack_coefficient(&space, &b).unwrap(), 0.001);
        assert_eq!(resolve_wind_coefficient(&space, &b).unwrap(), 0.002);
    }

    #[test]
    fn test_wind_coefficient_table() {
        let space = Space::new("room");
        let cases = [
            (ShelterClass::NoObstructions, 1, 0.000319),
            (ShelterClass::IsolatedRural, 2, 0.000325),
            (ShelterClass::Urban, 3, 0.000271),
            (ShelterClass::LargeLotUrban, 1, 0.000104),
            (ShelterClass::SmallLotUrban, 4, 0.000049),
        ];
        for (shelter, storeys, expected) in cases {
            let cw =
                resolve_wind_coefficient(&space, &building(Some(storeys), Some(shelter))).unwrap();
            assert_eq!(cw, expected);
        }
    }

    #[test]
    fn test_wind_coefficient_rejects_zero_storeys() {
        let space = Space::new("room");
        let err = resolve_wind_coefficient(&space, &building(Some(0), Some(ShelterClass::Urban)))
            .unwrap_err();
        assert!(err.to_string().contains("0 storeys"));
    }

    #[test]
    fn test_wind_coefficient_needs_storeys_and_shelter() {
        let space = Space::new("room");
        assert!(resolve_wind_coefficient(&space, &building(None, Some(ShelterClass::Urban))).is_err());
        assert!(resolve_wind_coefficient(&space, &building(Some(2), None)).is_err());
    }

    #[test]
    fn test_leakage_area_requires_building() {
        let model = BuildingModel::default();
        let space = Space::new("room");
        let err = InfiltrationResolver::new(
            &space,
            &Infiltration::EffectiveAirLeakageArea { area: 100. },
            &model,
        )
        .unwrap_err();
        assert!(err.to_string().contains("no building"));
    }

    #[test]
    fn test_leakage_area_with_unknown_building() {
        let model = BuildingModel {
            buildings: vec![building(Some(1), Some(ShelterClass::Urban))],
            spaces: vec![],
        };
        let space = Space {
            building: Some("shed".to_string()),
            ..Space::new("room")
        };
        let err = InfiltrationResolver::new(
            &space,
            &Infiltration::EffectiveAirLeakageArea { area: 100. },
            &model,
        )
        .unwrap_err();
        assert!(err.to_string().contains("'shed'"));
        assert!(!err.to_string().contains("no building"));
    }

    #[test]
    fn test_leakage_area_resolution() {
        let model = BuildingModel {
            buildings: vec![building(Some(1), Some(ShelterClass::NoObstructions))],
            spaces: vec![],
        };
        let space = Space {
            building: Some("house".to_string()),
            ..Space::new("room")
        };
        let resolver = InfiltrationResolver::new(
            &space,
            &Infiltration::EffectiveAirLeakageArea { area: 100. },
            &model,
        )
        .unwrap();
        assert_eq!(
            resolver,
            InfiltrationResolver::EffectiveLeakageArea {
                area: 100.,
                cw: 0.000319,
                cs: 0.000145
            }
        );

        let flow = resolver.resolve(&weather(0., 4.), 20.).unwrap();
        assert!((flow - 0.0089465).abs() < 1e-6);

        let calm = CurrentWeather {
            dry_bulb_temperature: Some(0.),
            ..Default::default()
        };
        let calm_flow = resolver.resolve(&calm, 20.).unwrap();
        assert!((calm_flow - 0.1 * (0.000145_f64 * 20.).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_design_flow_rate_requires_wind() {
        let model = BuildingModel::default();
        let space = Space::new("room");
        let resolver =
            InfiltrationResolver::new(&space, &Infiltration::Blast { flow: 1. }, &model).unwrap();
        let no_wind = CurrentWeather {
            dry_bulb_temperature: Some(2.),
            ..Default::default()
        };
        assert!(resolver.resolve(&no_wind, 2.).is_err());
        let flow = resolver.resolve(&weather(2., 3.35), 2.).unwrap();
        assert!((flow - 1.).abs() < 0.02);
    }

    #[test]
    fn test_flow_coefficient_resolution() {
        let infiltration = Infiltration::FlowCoefficient {
            flow_coefficient: 0.05,
            pressure_exponent: 0.67,
            stack_coefficient: 0.1,
            wind_coefficient: 0.15,
            shelter_factor: 0.7,
        };
        let resolver =
            InfiltrationResolver::new(&Space::new("room"), &infiltration, &BuildingModel::default())
                .unwrap();
        assert_eq!(
            resolver,
            InfiltrationResolver::FlowCoefficient {
                c: 0.05,
                n: 0.67,
                cs: 0.1,
                cw: 0.15,
                shelter_factor: 0.7
            }
        );

        let flow = resolver.resolve(&weather(0., 4.), 20.).unwrap();
        let stack = 0.05 * 0.1 * 20_f64.powf(0.67);
        let wind = 0.05 * 0.15 * (0.7_f64 * 4.).powf(1.34);
        assert!((flow - (stack * stack + wind * wind).sqrt()).abs() < 1e-12);

        // No wind speed counts as calm air.
        let calm = CurrentWeather {
            dry_bulb_temperature: Some(0.),
            ..Default::default()
        };
        assert!((resolver.resolve(&calm, 20.).unwrap() - stack).abs() < 1e-12);
    }

    #[test]
    fn test_negative_design_flow_is_clamped_to_zero() {
        let infiltration = Infiltration::DesignFlowRate {
            flow: 0.1,
            a: 0.2,
            b: -0.05,
            c: 0.,
            d: 0.,
        };
        let resolver =
            InfiltrationResolver::new(&Space::new("room"), &infiltration, &BuildingModel::default())
                .unwrap();
        assert_eq!(resolver.resolve(&weather(0., 0.), 20.).unwrap(), 0.);

        let ventilation = VentilationResolver::new(&Ventilation::DesignFlowRate {
            flow: 0.1,
            a: 0.2,
            b: -0.05,
            c: 0.,
            d: 0.,
            limits: VentilationLimits::default(),
        });
        assert_eq!(ventilation.resolve(&weather(0., 0.), 20.).unwrap(), 0.);
    }

    #[test]
    fn test_constant_ignores_weather() {
        let resolver = InfiltrationResolver::Constant(0.3);
        assert_eq!(resolver.resolve(&CurrentWeather::default(), 20.).unwrap(), 0.3);
    }

    #[test]
    fn test_ventilation_limits_shut_off_flow() {
        let resolver = VentilationResolver::new(&Ventilation::DesignFlowRate {
            flow: 0.5,
            a: 1.,
            b: 0.,
            c: 0.,
            d: 0.,
            limits: VentilationLimits {
                min_indoor_temperature: Some(22.),
                ..Default::default()
            },
        });
        assert_eq!(resolver.resolve(&weather(10., 2.), 20.).unwrap(), 0.);
        assert_eq!(resolver.resolve(&weather(10., 2.), 24.).unwrap(), 0.5);
    }

    #[test]
    fn test_wind_and_stack_needs_direction_when_autocalculated() {
        let resolver = VentilationResolver::new(&Ventilation::WindAndStackOpenArea {
            opening_area: 1.,
            opening_effectiveness: None,
            effective_angle: 0.,
            height_difference: 0.,
            discharge_coefficient: None,
            limits: VentilationLimits::default(),
        });
        assert!(resolver.resolve(&weather(10., 2.), 20.).is_err());

        let facing_wind = CurrentWeather {
            wind_direction: Some(0.),
            ..weather(10., 2.)
        };
        let flow = resolver.resolve(&facing_wind, 20.).unwrap();
        assert!((flow - 1.1).abs() < 1e-12);
    }
}
