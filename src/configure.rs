use crate::common::{
    CostDiscretization, HessianApprox, Integrator, NlpSolverType, Setup, SolverOptions,
};
use crate::error::ConfigurationError;
use crate::params::ParameterBundle;
use crate::traits::Model;
use log::debug;

/// Collocation stages of the implicit integrator.
pub const IRK_STAGES: usize = 4;
/// Integration steps per shooting interval.
pub const IRK_STEPS: usize = 1;

/// Chooses the solve strategy for `model` under the given tuning and setup.
///
/// Linear MPC steps the pre-discretized model directly; otherwise a 4-stage
/// implicit Runge-Kutta scheme takes one step per shooting interval. The QP
/// is condensed over the full horizon. The Hessian is always Gauss-Newton,
/// damped by `setup.levenberg_marquardt`.
///
/// # Errors
///
/// Fails if the model lacks the dynamics form the chosen integrator needs,
/// if cost integration is asked for together with discrete dynamics, or if
/// the regularization, iteration limit or tolerance is invalid.
pub fn configure(
    model: &dyn Model,
    params: &ParameterBundle,
    setup: &Setup,
) -> Result<SolverOptions, ConfigurationError> {
    let integrator = if params.linear_mpc() {
        if setup.cost_integration {
            return Err(ConfigurationError::DiscreteCostIntegration);
        }
        if !model.has_discrete_dynamics() {
            return Err(ConfigurationError::MissingDiscreteDynamics {
                model: model.name().to_string(),
            });
        }
        Integrator::Discrete
    } else {
        if !model.has_continuous_dynamics() {
            return Err(ConfigurationError::MissingContinuousDynamics {
                model: model.name().to_string(),
            });
        }
        Integrator::ImplicitRungeKutta {
            stages: IRK_STAGES,
            steps: IRK_STEPS,
        }
    };

    let lm = setup.levenberg_marquardt;
    if !lm.is_finite() || lm < 0.0 {
        return Err(ConfigurationError::Regularization(lm));
    }
    if setup.nlp_max_iter == 0 {
        return Err(ConfigurationError::MaxIter);
    }
    if !setup.tol.is_finite() || setup.tol <= 0.0 {
        return Err(ConfigurationError::Tolerance(setup.tol));
    }

    let nlp_solver_type = if setup.use_rti {
        NlpSolverType::SqpRti
    } else {
        NlpSolverType::Sqp
    };
    let cost_discretization = if setup.cost_integration {
        CostDiscretization::Integrator
    } else {
        CostDiscretization::Euler
    };

    let options = SolverOptions {
        n_horizon: params.n(),
        tf: params.tf(),
        integrator,
        qp_solver: setup.qp_solver,
        qp_solver_cond_n: params.n(),
        hessian_approx: HessianApprox::GaussNewton,
        levenberg_marquardt: lm,
        nlp_solver_type,
        nlp_max_iter: setup.nlp_max_iter,
        tol: setup.tol,
        cost_discretization,
    };
    debug!("solver options: {:?}", options);

    Ok(options)
}
