//! Linear regression formulas for Doppler-derived shunt parameters.
//!
//! Every velocity parameter is `c0 + c1*FV + c2*RI + c3*diameter` with a fixed
//! coefficient tuple. PI and TAVR are ratios over TAMV and collapse to zero when
//! TAMV is zero.

use serde::{Deserialize, Serialize};

/// Fixed coefficients of one linear formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub intercept: f64,
    pub flow_volume: f64,
    pub resistance_index: f64,
    pub vessel_diameter: f64,
}

impl Coefficients {
    const fn new(
        intercept: f64,
        flow_volume: f64,
        resistance_index: f64,
        vessel_diameter: f64,
    ) -> Self {
        Self {
            intercept,
            flow_volume,
            resistance_index,
            vessel_diameter,
        }
    }

    /// Evaluate the linear form.
    pub fn apply(&self, flow_volume: f64, resistance_index: f64, vessel_diameter: f64) -> f64 {
        self.intercept
            + self.flow_volume * flow_volume
            + self.resistance_index * resistance_index
            + self.vessel_diameter * vessel_diameter
    }
}

/// Peak systolic velocity (cm/s).
pub const PSV_COEFFICIENTS: Coefficients = Coefficients::new(37.664, 0.0619, 52.569, -1.2);
/// End-diastolic velocity (cm/s).
pub const EDV_COEFFICIENTS: Coefficients = Coefficients::new(69.506, 0.0305, -74.499, -0.8);
/// Time-averaged velocity (cm/s).
pub const TAV_COEFFICIENTS: Coefficients = Coefficients::new(43.664, 0.0298, -35.760, -0.6);
/// Time-averaged maximum velocity (cm/s).
pub const TAMV_COEFFICIENTS: Coefficients = Coefficients::new(65.0, 0.0452, -30.789, -1.0);

/// Parameters derived from FV, RI and vessel diameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedParameters {
    pub psv: f64,
    pub edv: f64,
    pub tav: f64,
    pub tamv: f64,
    pub pi: f64,
    pub tavr: f64,
}

/// Derive PSV, EDV, TAV, TAMV, PI and TAVR.
///
/// Total over the reals: inputs are not range-checked here.
pub fn derive_parameters(
    flow_volume: f64,
    resistance_index: f64,
    vessel_diameter: f64,
) -> DerivedParameters {
    let psv = PSV_COEFFICIENTS.apply(flow_volume, resistance_index, vessel_diameter);
    let edv = EDV_COEFFICIENTS.apply(flow_volume, resistance_index, vessel_diameter);
    let tav = TAV_COEFFICIENTS.apply(flow_volume, resistance_index, vessel_diameter);
    let tamv = TAMV_COEFFICIENTS.apply(flow_volume, resistance_index, vessel_diameter);

    DerivedParameters {
        psv,
        edv,
        tav,
        tamv,
        pi: ratio_or_zero(psv - edv, tamv),
        tavr: ratio_or_zero(tav, tamv),
    }
}

fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_baseline_psv() {
        let params = derive_parameters(380.0, 0.68, 5.0);
        // 37.664 + 23.522 + 35.74692 - 6.0
        assert!((params.psv - 90.93292).abs() < EPS);
    }

    #[test]
    fn test_baseline_all_parameters() {
        let params = derive_parameters(380.0, 0.68, 5.0);
        assert!((params.edv - 26.43668).abs() < EPS);
        assert!((params.tav - 27.6712).abs() < EPS);
        assert!((params.tamv - 56.23948).abs() < EPS);
        assert!((params.pi - (params.psv - params.edv) / params.tamv).abs() < EPS);
        assert!((params.tavr - params.tav / params.tamv).abs() < EPS);
        assert!((params.pi - 1.146814301981455).abs() < 1e-9);
    }

    #[test]
    fn test_zero_tamv_yields_zero_ratios() {
        // 65.0 - 1.0 * 65.0 == 0.0 exactly
        let params = derive_parameters(0.0, 0.0, 65.0);
        assert_eq!(params.tamv, 0.0);
        assert_eq!(params.pi, 0.0);
        assert_eq!(params.tavr, 0.0);
        assert!(params.psv.is_finite());
    }

    #[test]
    fn test_ratio_or_zero() {
        assert_eq!(ratio_or_zero(5.0, 0.0), 0.0);
        assert_eq!(ratio_or_zero(-5.0, 0.0), 0.0);
        assert_eq!(ratio_or_zero(5.0, 2.0), 2.5);
    }

    #[test]
    fn test_negative_inputs_are_not_rejected() {
        let params = derive_parameters(-100.0, -1.0, -3.0);
        assert!(params.psv.is_finite());
        assert!(params.tamv.is_finite());
    }
}
