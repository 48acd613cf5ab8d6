use float_cmp::assert_approx_eq;
use nalgebra::DVector;

use crate::cstr::{nominal_constants, terminal_weight, CstrModel};
use crate::{
    build, OcpDescriptor, ParameterBundle, ReferenceProfile, Residual, Setup, Symbol, Tuning,
    ValidationError,
};

fn bundle() -> ParameterBundle {
    let c = nominal_constants();
    ParameterBundle::derive(&c.xs, &c.us, terminal_weight(), &Tuning::default()).unwrap()
}

fn build_with(setup: &Setup) -> OcpDescriptor {
    build(&CstrModel::nonlinear(), &bundle(), &nominal_constants(), setup).unwrap()
}

fn target() -> DVector<f64> {
    DVector::from_vec(vec![0.9, 320.0, 0.7, 305.0, 0.11])
}

#[test]
fn unshifted_without_profile() {
    let ocp = build_with(&Setup::default());

    assert!(!ocp.cost.y_expr.is_shifted());
    assert!(!ocp.cost.y_expr_e.is_shifted());
    assert!(ocp.reference.is_none());
    assert_eq!(ocp.parameter_values.len(), 1);
    assert_eq!(ocp.dims.np, 1);
    assert_eq!(
        ocp.cost.y_expr.residuals[3],
        Residual {
            symbol: Symbol::Input(0),
            reference: None
        }
    );
}

#[test]
fn profile_adds_selector_slot() {
    let setup = Setup {
        reference_profile: Some(ReferenceProfile::constant(target())),
        ..Default::default()
    };
    let ocp = build(&CstrModel::nonlinear(), &bundle(), &nominal_constants(), &setup).unwrap();

    assert_eq!(ocp.parameter_values.len(), 2);
    assert_eq!(ocp.parameter_values[0], 0.1);
    assert_eq!(ocp.parameter_values[1], 0.0);
    assert_eq!(ocp.reference.as_ref().unwrap().selector, 1);

    assert!(ocp.cost.y_expr.is_shifted());
    assert!(ocp.cost.y_expr_e.is_shifted());
    assert_eq!(ocp.cost.y_expr.len(), 5);
    assert_eq!(ocp.cost.y_expr_e.len(), 3);
    assert_eq!(ocp.cost.y_expr_e.residuals[2].reference, Some(2));
}

#[test]
fn residuals_are_recentred() {
    let setup = Setup {
        reference_profile: Some(ReferenceProfile::constant(target())),
        ..Default::default()
    };
    let ocp = build(&CstrModel::nonlinear(), &bundle(), &nominal_constants(), &setup).unwrap();

    let x = DVector::from_vec(vec![0.9, 320.0, 0.7]);
    let u = DVector::from_vec(vec![305.0, 0.11]);
    let p = ocp.parameter_values.clone();

    let r = ocp.stage_residual(&x, &u, &p).unwrap();
    assert!(r.iter().all(|v| v.abs() < 1e-12));
    assert_approx_eq!(f64, ocp.stage_cost(&x, &u, &p).unwrap(), 0.0, epsilon = 1e-20);

    let x = DVector::from_vec(vec![1.0, 320.0, 0.7]);
    let r = ocp.terminal_residual(&x, &p).unwrap();
    assert_approx_eq!(f64, r[0], 0.1, epsilon = 1e-12);
    assert_eq!(r[1], 0.0);
}

#[test]
fn selector_picks_segment() {
    let first = target();
    let second = DVector::from_vec(vec![0.8, 330.0, 0.6, 295.0, 0.09]);
    let profile = ReferenceProfile::piecewise(vec![first.clone(), second.clone()]).unwrap();

    assert_eq!(profile.select(0.0), &first);
    assert_eq!(profile.select(0.99), &first);
    assert_eq!(profile.select(1.0), &second);
    assert_eq!(profile.select(7.5), &second);
    assert_eq!(profile.select(-3.0), &first);
    assert_eq!(profile.select(f64::NAN), &first);
    assert_eq!(profile.select(f64::INFINITY), &second);

    let setup = Setup {
        reference_profile: Some(profile),
        ..Default::default()
    };
    let ocp = build(&CstrModel::nonlinear(), &bundle(), &nominal_constants(), &setup).unwrap();
    let x = DVector::from_vec(vec![0.8, 330.0, 0.6]);
    let u = DVector::from_vec(vec![295.0, 0.09]);
    let p = DVector::from_vec(vec![0.1, 1.0]);
    let r = ocp.stage_residual(&x, &u, &p).unwrap();
    assert!(r.iter().all(|v| v.abs() < 1e-12));
}

#[test]
fn profile_length_mismatch() {
    let setup = Setup {
        reference_profile: Some(ReferenceProfile::constant(DVector::from_vec(vec![
            0.9, 320.0, 0.7,
        ]))),
        ..Default::default()
    };
    let err = build(&CstrModel::nonlinear(), &bundle(), &nominal_constants(), &setup).unwrap_err();
    assert!(matches!(
        err,
        crate::OcpError::Validation(ValidationError::Dimension {
            field: "reference_profile",
            expected: 5,
            actual: 3
        })
    ));
}

#[test]
fn piecewise_profile_checks() {
    assert_eq!(ReferenceProfile::piecewise(vec![]).unwrap_err(), ValidationError::EmptyProfile);

    let err = ReferenceProfile::piecewise(vec![target(), DVector::zeros(4)]).unwrap_err();
    assert!(matches!(err, ValidationError::Dimension { expected: 5, actual: 4, .. }));

    let mut bad = target();
    bad[2] = f64::NAN;
    let err = ReferenceProfile::piecewise(vec![bad]).unwrap_err();
    assert_eq!(
        err,
        ValidationError::NotFinite {
            field: "reference_profile",
            index: 2
        }
    );
}

#[test]
fn stale_selector_is_an_error() {
    let setup = Setup {
        reference_profile: Some(ReferenceProfile::constant(target())),
        ..Default::default()
    };
    let mut ocp = build_with(&setup);
    let x = DVector::from_vec(vec![0.8, 330.0, 0.6]);
    let u = DVector::from_vec(vec![295.0, 0.09]);
    let p = ocp.parameter_values.clone();
    ocp.stage_residual(&x, &u, &p).unwrap();

    ocp.reference.as_mut().unwrap().selector = 5;
    let err = ocp.stage_residual(&x, &u, &p).unwrap_err();
    assert_eq!(
        err,
        ValidationError::OutOfRange {
            field: "reference selector",
            index: 5,
            len: 2
        }
    );
    assert!(ocp.terminal_residual(&x, &p).is_err());
    assert!(ocp.stage_cost(&x, &u, &p).is_err());
}

#[test]
fn stale_cost_map_is_an_error() {
    let mut ocp = build_with(&Setup::default());
    let x = DVector::from_vec(vec![0.8, 330.0, 0.6]);
    let u = DVector::from_vec(vec![295.0, 0.09]);
    let p = ocp.parameter_values.clone();

    ocp.cost.y_expr.residuals[4].symbol = Symbol::Input(7);
    let err = ocp.stage_residual(&x, &u, &p).unwrap_err();
    assert_eq!(
        err,
        ValidationError::OutOfRange {
            field: "u",
            index: 7,
            len: 2
        }
    );

    let mut ocp = build_with(&Setup::default());
    ocp.cost.w_e = nalgebra::DMatrix::identity(2, 2);
    assert!(matches!(
        ocp.terminal_cost(&x, &p).unwrap_err(),
        ValidationError::Dimension { field: "W_e", .. }
    ));
}
