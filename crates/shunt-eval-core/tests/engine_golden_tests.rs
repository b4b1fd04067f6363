//! Golden tests for the formula and scoring engines.
//!
//! Expected values were computed by hand from the regression coefficients.

use proptest::prelude::*;
use shunt_eval_core::engine::{derive_parameters, score_findings, CUTOFFS};

/// Test case from golden file.
struct GoldenCase {
    id: &'static str,
    flow_volume: f64,
    resistance_index: f64,
    vessel_diameter: f64,
    psv: f64,
    edv: f64,
    tav: f64,
    tamv: f64,
    pi: f64,
    tavr: f64,
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "baseline",
            flow_volume: 380.0,
            resistance_index: 0.68,
            vessel_diameter: 5.0,
            psv: 90.93292,
            edv: 26.43668,
            tav: 27.6712,
            tamv: 56.23948,
            pi: 1.146814301981455,
            tavr: 0.49202446395308064,
        },
        GoldenCase {
            id: "high-flow-low-resistance",
            flow_volume: 1000.0,
            resistance_index: 0.5,
            vessel_diameter: 6.0,
            psv: 118.6485,
            edv: 57.9565,
            tav: 51.984,
            tamv: 88.8055,
            pi: 0.6834261391467871,
            tavr: 0.5853691494333122,
        },
        GoldenCase {
            id: "low-flow-high-resistance",
            flow_volume: 200.0,
            resistance_index: 0.9,
            vessel_diameter: 4.0,
            psv: 92.5561,
            edv: 5.3569,
            tav: 15.04,
            tamv: 42.3299,
            pi: 2.059990692158498,
            tavr: 0.35530440657785645,
        },
    ]
}

const EPS: f64 = 1e-9;

#[test]
fn test_golden_derivations() {
    for case in get_golden_cases() {
        let p = derive_parameters(case.flow_volume, case.resistance_index, case.vessel_diameter);
        assert!((p.psv - case.psv).abs() < EPS, "{}: PSV {}", case.id, p.psv);
        assert!((p.edv - case.edv).abs() < EPS, "{}: EDV {}", case.id, p.edv);
        assert!((p.tav - case.tav).abs() < EPS, "{}: TAV {}", case.id, p.tav);
        assert!((p.tamv - case.tamv).abs() < EPS, "{}: TAMV {}", case.id, p.tamv);
        assert!((p.pi - case.pi).abs() < EPS, "{}: PI {}", case.id, p.pi);
        assert!((p.tavr - case.tavr).abs() < EPS, "{}: TAVR {}", case.id, p.tavr);
    }
}

#[test]
fn test_golden_scores() {
    // baseline: TAV, RI, EDV trigger
    let baseline = derive_parameters(380.0, 0.68, 5.0);
    let assessment = score_findings(baseline.tav, 0.68, baseline.pi, baseline.edv);
    assert_eq!(assessment.score, 3);

    // high flow: nothing triggers
    let high = derive_parameters(1000.0, 0.5, 6.0);
    assert_eq!(score_findings(high.tav, 0.5, high.pi, high.edv).score, 0);

    // low flow: every rule triggers
    let low = derive_parameters(200.0, 0.9, 4.0);
    let assessment = score_findings(low.tav, 0.9, low.pi, low.edv);
    assert_eq!(assessment.score, 4);
    let expected: Vec<_> = CUTOFFS.iter().map(|c| c.finding.to_string()).collect();
    assert_eq!(assessment.comments, expected);
}

#[test]
fn test_inclusive_boundaries() {
    let assessment = score_findings(34.5, 0.68, 1.3, 40.4);
    assert_eq!(assessment.score, 4);
    assert_eq!(assessment.comments.len(), 4);
    assert_eq!(assessment.comments[0], "low TAV suggests reduced flow");
    assert_eq!(assessment.comments[1], "elevated RI suggests high resistance");
    assert_eq!(assessment.comments[2], "elevated PI");
    assert_eq!(assessment.comments[3], "low EDV suggests reduced diastolic flow");
}

#[test]
fn test_no_findings() {
    let assessment = score_findings(100.0, 0.3, 0.5, 100.0);
    assert_eq!(assessment.score, 0);
    assert!(assessment.comments.is_empty());
}

#[test]
fn test_zero_tamv_policy() {
    let p = derive_parameters(0.0, 0.0, 65.0);
    assert_eq!(p.tamv, 0.0);
    assert_eq!(p.pi, 0.0);
    assert_eq!(p.tavr, 0.0);
}

proptest! {
    #[test]
    fn prop_derivation_is_deterministic(
        fv in 0.0f64..3000.0,
        ri in 0.0f64..1.5,
        diameter in 0.0f64..10.0,
    ) {
        let first = derive_parameters(fv, ri, diameter);
        let second = derive_parameters(fv, ri, diameter);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_ratios_follow_definitions(
        fv in 100.0f64..2000.0,
        ri in 0.4f64..1.0,
        diameter in 3.0f64..7.0,
    ) {
        let p = derive_parameters(fv, ri, diameter);
        // TAMV stays well above zero inside the slider ranges
        prop_assert!(p.tamv > 0.0);
        prop_assert!((p.pi - (p.psv - p.edv) / p.tamv).abs() < 1e-12);
        prop_assert!((p.tavr - p.tav / p.tamv).abs() < 1e-12);
    }

    #[test]
    fn prop_score_matches_comment_count(
        tav in -10.0f64..200.0,
        ri in 0.0f64..2.0,
        pi in 0.0f64..5.0,
        edv in -10.0f64..200.0,
    ) {
        let assessment = score_findings(tav, ri, pi, edv);
        prop_assert!(assessment.score <= 4);
        prop_assert_eq!(assessment.score as usize, assessment.comments.len());
    }
}
