//! Measurement inputs and clinical parameter sets.

use serde::{Deserialize, Serialize};

use crate::engine::{
    derive_parameters, score_findings, Assessment, DerivedParameters, ScoredParameter,
};

/// Advisory widget range for a simulator input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl InputRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Flow volume slider range (ml/min).
pub const FLOW_VOLUME_RANGE: InputRange = InputRange {
    min: 100.0,
    max: 2000.0,
    step: 10.0,
};
/// Resistance index slider range.
pub const RESISTANCE_INDEX_RANGE: InputRange = InputRange {
    min: 0.4,
    max: 1.0,
    step: 0.01,
};
/// Vessel diameter slider range (mm).
pub const VESSEL_DIAMETER_RANGE: InputRange = InputRange {
    min: 3.0,
    max: 7.0,
    step: 0.1,
};

/// Simulator input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementInput {
    /// Flow volume (ml/min)
    pub flow_volume: f64,
    /// Resistance index (unitless)
    pub resistance_index: f64,
    /// Vessel diameter (mm)
    pub vessel_diameter: f64,
}

impl Default for MeasurementInput {
    fn default() -> Self {
        Self::baseline()
    }
}

impl MeasurementInput {
    /// Simulator starting point: FV 380, RI 0.68, diameter 5.0.
    pub fn baseline() -> Self {
        Self {
            flow_volume: 380.0,
            resistance_index: 0.68,
            vessel_diameter: 5.0,
        }
    }

    pub fn derive(&self) -> DerivedParameters {
        derive_parameters(self.flow_volume, self.resistance_index, self.vessel_diameter)
    }

    /// Derive parameters and score them without persisting anything.
    pub fn simulate(&self) -> Simulation {
        let parameters = self.derive();
        let assessment = score_findings(
            parameters.tav,
            self.resistance_index,
            parameters.pi,
            parameters.edv,
        );
        Simulation {
            input: *self,
            parameters,
            assessment,
        }
    }

    /// Names of inputs outside the advisory slider ranges.
    ///
    /// Informational only; the formula engine accepts any real input.
    pub fn out_of_range(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if !FLOW_VOLUME_RANGE.contains(self.flow_volume) {
            fields.push("flow_volume");
        }
        if !RESISTANCE_INDEX_RANGE.contains(self.resistance_index) {
            fields.push("resistance_index");
        }
        if !VESSEL_DIAMETER_RANGE.contains(self.vessel_diameter) {
            fields.push("vessel_diameter");
        }
        fields
    }
}

/// Simulation-mode result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub input: MeasurementInput,
    pub parameters: DerivedParameters,
    pub assessment: Assessment,
}

/// Clinical parameter set entered on the evaluation form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    /// Flow volume (ml/min)
    pub fv: f64,
    /// Resistance index
    pub ri: f64,
    /// Pulsatility index
    pub pi: f64,
    /// Time-averaged velocity (cm/s)
    pub tav: f64,
    /// Time-averaged maximum velocity (cm/s)
    pub tamv: f64,
    /// Peak systolic velocity (cm/s)
    pub psv: f64,
    /// End-diastolic velocity (cm/s)
    pub edv: f64,
}

impl Default for Measurements {
    /// Evaluation form defaults.
    fn default() -> Self {
        Self {
            fv: 400.0,
            ri: 0.6,
            pi: 1.2,
            tav: 60.0,
            tamv: 100.0,
            psv: 120.0,
            edv: 50.0,
        }
    }
}

impl Measurements {
    /// Build a parameter set from a simulated derivation.
    pub fn from_derived(flow_volume: f64, resistance_index: f64, derived: &DerivedParameters) -> Self {
        Self {
            fv: flow_volume,
            ri: resistance_index,
            pi: derived.pi,
            tav: derived.tav,
            tamv: derived.tamv,
            psv: derived.psv,
            edv: derived.edv,
        }
    }

    pub fn assess(&self) -> Assessment {
        score_findings(self.tav, self.ri, self.pi, self.edv)
    }

    /// Value of a parameter that takes part in scoring.
    pub fn scored_value(&self, parameter: ScoredParameter) -> f64 {
        match parameter {
            ScoredParameter::Tav => self.tav,
            ScoredParameter::Ri => self.ri,
            ScoredParameter::Pi => self.pi,
            ScoredParameter::Edv => self.edv,
        }
    }

    /// Name of the first non-finite field, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        [
            ("FV", self.fv),
            ("RI", self.ri),
            ("PI", self.pi),
            ("TAV", self.tav),
            ("TAMV", self.tamv),
            ("PSV", self.psv),
            ("EDV", self.edv),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(name, _)| name)
    }
}
