use nalgebra::DVector;

use crate::cstr::{setup_ocp, CstrModel};
use crate::{ErrorKind, OcpDescriptor, ReferenceProfile, Setup, Tuning, ValidationError};

fn nominal_ocp() -> OcpDescriptor {
    setup_ocp(&CstrModel::nonlinear(), &Tuning::default(), &Setup::default()).unwrap()
}

#[test]
fn json_file_round_trip() {
    let setup = Setup {
        use_rti: true,
        cost_integration: true,
        reference_profile: Some(ReferenceProfile::constant(DVector::from_vec(vec![
            0.9, 320.0, 0.7, 305.0, 0.11,
        ]))),
        ..Default::default()
    };
    let ocp = setup_ocp(&CstrModel::nonlinear(), &Tuning::default(), &setup).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ocp.json");
    ocp.write_json(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"IRK\""));
    assert!(text.contains("\"SQP_RTI\""));
    assert!(text.contains("\"PARTIAL_CONDENSING_HPIPM\""));
    assert!(text.contains("\"NONLINEAR_LS\""));

    let back = OcpDescriptor::read_json(&path).unwrap();
    assert_eq!(back, ocp);
}

#[test]
fn invalid_file_is_rejected() {
    let mut ocp = nominal_ocp();
    ocp.parameter_values = DVector::zeros(3);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ocp.json");
    ocp.write_json(&path).unwrap();

    let err = OcpDescriptor::read_json(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    std::fs::write(&path, "{ \"model_name\": 3 }").unwrap();
    assert_eq!(OcpDescriptor::read_json(&path).unwrap_err().kind(), ErrorKind::Io);
    assert_eq!(
        OcpDescriptor::read_json(dir.path().join("missing.json"))
            .unwrap_err()
            .kind(),
        ErrorKind::Io
    );
}

#[test]
fn shifted_map_needs_binding() {
    let setup = Setup {
        reference_profile: Some(ReferenceProfile::constant(DVector::zeros(5))),
        ..Default::default()
    };
    let mut ocp = setup_ocp(&CstrModel::nonlinear(), &Tuning::default(), &setup).unwrap();
    ocp.validate().unwrap();

    ocp.reference = None;
    assert_eq!(ocp.validate().unwrap_err(), ValidationError::NoReference);
}

#[test]
fn horizon_must_agree() {
    let mut ocp = nominal_ocp();
    ocp.options.n_horizon = 8;
    assert_eq!(
        ocp.validate().unwrap_err(),
        ValidationError::Dimension {
            field: "n_horizon",
            expected: 16,
            actual: 8
        }
    );

    ocp.options.n_horizon = 16;
    ocp.options.tf = 0.0;
    assert!(matches!(
        ocp.validate().unwrap_err(),
        ValidationError::NotPositive { field: "tf", .. }
    ));
}

#[test]
fn terminal_cost_uses_lqr_weight() {
    let ocp = nominal_ocp();
    let p = ocp.parameter_values.clone();

    assert_eq!(ocp.terminal_cost(&DVector::zeros(3), &p).unwrap(), 0.0);
    let x = DVector::from_vec(vec![0.0, 0.0, 1.0]);
    let cost = ocp.terminal_cost(&x, &p).unwrap();
    assert!((cost - 0.5 * 2.59450075).abs() < 1e-12);
    assert!(ocp.terminal_cost(&DVector::zeros(2), &p).is_err());
}
