//! Infiltration and ventilation equations from the EnergyPlus Engineering Reference.
//!
//! Temperatures are in °C, wind speeds in m/s and flows in m³/s unless noted.

/// Standard gravity, m/s².
pub const GRAVITY: f64 = 9.80665;

/// BLAST defaults for `A`, `B`, `C` and `D` (EnergyPlus Input/Output Reference).
pub const BLAST_COEFFICIENTS: [f64; 4] = [0.606, 0.03636, 0.1177, 0.0];

/// DOE-2 defaults for `A`, `B`, `C` and `D` (EnergyPlus Input/Output Reference).
pub const DOE2_COEFFICIENTS: [f64; 4] = [0.0, 0.0, 0.224, 0.0];

/// `ZoneInfiltration:DesignFlowRate` and `ZoneVentilation:DesignFlowRate`:
/// φ = φ_design (A + B|T_space − T_out| + C·W + D·W²)
#[allow(clippy::too_many_arguments)]
pub fn design_flow_rate(
    design_rate: f64,
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    t_space: f64,
    t_out: f64,
    wind_speed: f64,
) -> f64 {
    design_rate * (a + b * (t_space - t_out).abs() + c * wind_speed + d * wind_speed * wind_speed)
}

pub fn blast_design_flow_rate(design_rate: f64, t_space: f64, t_out: f64, wind_speed: f64) -> f64 {
    let [a, b, c, d] = BLAST_COEFFICIENTS;
    design_flow_rate(design_rate, a, b, c, d, t_space, t_out, wind_speed)
}

pub fn doe2_design_flow_rate(design_rate: f64, t_space: f64, t_out: f64, wind_speed: f64) -> f64 {
    let [a, b, c, d] = DOE2_COEFFICIENTS;
    design_flow_rate(design_rate, a, b, c, d, t_space, t_out, wind_speed)
}

/// `ZoneInfiltration:EffectiveLeakageArea` (Sherman and Grimsrud):
/// φ = (A_L / 1000) √(C_s|ΔT| + C_w W²)
///
/// `area` is in cm²; `cw` and `cs` in the units of the ASHRAE tables.
pub fn effective_leakage_area(
    area: f64,
    cw: f64,
    cs: f64,
    t_space: f64,
    t_out: f64,
    wind_speed: f64,
) -> f64 {
    let delta_t = (t_out - t_space).abs();
    (area / 1000.) * (cs * delta_t + cw * wind_speed * wind_speed).sqrt()
}

/// `ZoneInfiltration:FlowCoefficient` (AIM-2, Walker and Wilson):
/// φ = √((c C_s |ΔT|ⁿ)² + (c C_w (s W)²ⁿ)²)
#[allow(clippy::too_many_arguments)]
pub fn flow_coefficient(
    c: f64,
    n: f64,
    cs: f64,
    cw: f64,
    shelter_factor: f64,
    t_space: f64,
    t_out: f64,
    wind_speed: f64,
) -> f64 {
    let stack = c * cs * (t_space - t_out).abs().powf(n);
    let wind = c * cw * (shelter_factor * wind_speed).powf(2. * n);
    (stack * stack + wind * wind).sqrt()
}

/// Opening effectiveness when it is autocalculated: 0.55 facing the wind,
/// 0.30 facing away from it.
pub fn auto_opening_effectiveness(effective_angle: f64, wind_direction: f64) -> f64 {
    let mut difference = (effective_angle - wind_direction).rem_euclid(360.);
    if difference > 180. {
        difference = 360. - difference;
    }
    0.55 - difference / 180. * 0.25
}

/// Discharge coefficient for the stack-driven flow when it is autocalculated.
pub fn auto_discharge_coefficient(t_space: f64, t_out: f64) -> f64 {
    0.4 + 0.0045 * (t_space - t_out).abs()
}

/// Q_w = C_w A_opening W
pub fn wind_driven_flow(opening_effectiveness: f64, opening_area: f64, wind_speed: f64) -> f64 {
    opening_effectiveness * opening_area * wind_speed
}

/// Q_s = C_D A_opening √(2 g ΔH_NPL |T_space − T_out| / T_space), with T_space in K.
pub fn stack_driven_flow(
    discharge_coefficient: f64,
    opening_area: f64,
    height_difference: f64,
    t_space: f64,
    t_out: f64,
) -> f64 {
    let t_space_kelvin = t_space + 273.15;
    discharge_coefficient
        * opening_area
        * (2. * GRAVITY * height_difference.abs() * (t_space - t_out).abs() / t_space_kelvin).sqrt()
}

/// `ZoneVentilation:WindandStackOpenArea`: Q = √(Q_w² + Q_s²)
pub fn wind_and_stack_flow(wind_flow: f64, stack_flow: f64) -> f64 {
    (wind_flow * wind_flow + stack_flow * stack_flow).sqrt()
}
