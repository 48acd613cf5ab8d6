use crate::cstr::{nominal_constants, terminal_weight, CstrModel};
use crate::{
    configure, ConfigurationError, CostDiscretization, HessianApprox, Integrator, NlpSolverType,
    ParameterBundle, QpSolver, Setup, Tuning,
};

fn bundle(linear_mpc: bool) -> ParameterBundle {
    let c = nominal_constants();
    let tuning = Tuning {
        linear_mpc,
        ..Default::default()
    };
    ParameterBundle::derive(&c.xs, &c.us, terminal_weight(), &tuning).unwrap()
}

#[test]
fn nonlinear_uses_implicit_integrator() {
    let opts = configure(&CstrModel::nonlinear(), &bundle(false), &Setup::default()).unwrap();

    assert_eq!(opts.integrator, Integrator::ImplicitRungeKutta { stages: 4, steps: 1 });
    assert_eq!(opts.integrator.name(), "IRK");
    assert_eq!(opts.qp_solver, QpSolver::PartialCondensingHpipm);
    assert_eq!(opts.qp_solver_cond_n, 16);
    assert_eq!(opts.hessian_approx, HessianApprox::GaussNewton);
    assert_eq!(opts.levenberg_marquardt, 1e-5);
    assert_eq!(opts.nlp_solver_type, NlpSolverType::Sqp);
    assert_eq!(opts.cost_discretization, CostDiscretization::Euler);
}

#[test]
fn linear_uses_discrete_dynamics() {
    let opts = configure(&CstrModel::linearized(), &bundle(true), &Setup::default()).unwrap();

    assert_eq!(opts.integrator, Integrator::Discrete);
    assert_eq!(opts.integrator.name(), "DISCRETE");
}

#[test]
fn rti_mode() {
    let setup = Setup {
        use_rti: true,
        ..Default::default()
    };
    let opts = configure(&CstrModel::nonlinear(), &bundle(false), &setup).unwrap();
    assert_eq!(opts.nlp_solver_type, NlpSolverType::SqpRti);
}

#[test]
fn cost_integration() {
    let setup = Setup {
        cost_integration: true,
        ..Default::default()
    };
    let opts = configure(&CstrModel::nonlinear(), &bundle(false), &setup).unwrap();
    assert_eq!(opts.cost_discretization, CostDiscretization::Integrator);

    let err = configure(&CstrModel::linearized(), &bundle(true), &setup).unwrap_err();
    assert_eq!(err, ConfigurationError::DiscreteCostIntegration);
}

#[test]
fn dynamics_form_must_match() {
    let err = configure(&CstrModel::nonlinear(), &bundle(true), &Setup::default()).unwrap_err();
    assert_eq!(
        err,
        ConfigurationError::MissingDiscreteDynamics {
            model: "cstr".to_string()
        }
    );

    let err = configure(&CstrModel::linearized(), &bundle(false), &Setup::default()).unwrap_err();
    assert_eq!(
        err,
        ConfigurationError::MissingContinuousDynamics {
            model: "cstr_linearized".to_string()
        }
    );
}

#[test]
fn swappable_qp_backend() {
    let setup = Setup {
        qp_solver: QpSolver::FullCondensingQpoases,
        ..Default::default()
    };
    let opts = configure(&CstrModel::nonlinear(), &bundle(false), &setup).unwrap();
    assert_eq!(opts.qp_solver, QpSolver::FullCondensingQpoases);
    assert!(!opts.qp_solver.is_partial_condensing());
    assert!(QpSolver::PartialCondensingOsqp.is_partial_condensing());
}

#[test]
fn invalid_numeric_options() {
    let setup = Setup {
        levenberg_marquardt: -1.0,
        ..Default::default()
    };
    let err = configure(&CstrModel::nonlinear(), &bundle(false), &setup).unwrap_err();
    assert_eq!(err, ConfigurationError::Regularization(-1.0));

    let setup = Setup {
        nlp_max_iter: 0,
        ..Default::default()
    };
    let err = configure(&CstrModel::nonlinear(), &bundle(false), &setup).unwrap_err();
    assert_eq!(err, ConfigurationError::MaxIter);

    let setup = Setup {
        tol: 0.0,
        ..Default::default()
    };
    let err = configure(&CstrModel::nonlinear(), &bundle(false), &setup).unwrap_err();
    assert_eq!(err, ConfigurationError::Tolerance(0.0));
}
