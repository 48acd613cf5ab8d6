use crate::common::{CostType, Setup};
use crate::configure::configure;
use crate::cost::CostMap;
use crate::error::{OcpError, ValidationError};
use crate::math::{block_diag, check_finite, check_len};
use crate::ocp::{Constraints, Cost, Dims, OcpDescriptor};
use crate::params::{ParameterBundle, ProcessConstants};
use crate::reference;
use crate::traits::Model;
use log::{info, warn};
use nalgebra::DVector;

/// Assembles the optimal control problem for `model`.
///
/// Minimize over the horizon `[0, Tf]`, split into `N` shooting intervals,
///
/// ```txt
///       sum_k 0.5 |y(x_k, u_k, p) - yref|^2_W  +  0.5 |y_e(x_N, p) - yref_e|^2_W_e
/// ```
///
/// subject to
///
/// ```txt
///       x_0 = x0                 (initial state)
///       x_k+1 = F(x_k, u_k, p)   (dynamics)
///       umin <= u_k <= umax      (input bounds)
/// ```
///
/// with `y = [x; u]`, `y_e = x`, `W = blkdiag(Q, R)`, `W_e = P` and zero
/// targets. Set-points therefore live in the model coordinates or, with
/// `setup.reference_profile`, in the shifted cost maps `y - r`, `y_e - r[..nx]`.
///
/// The nominal runtime parameters are `constants.parameters`, followed by the
/// reference selector when a profile is given. `x0` starts at the steady
/// state and is overwritten before every solve.
///
/// # Errors
///
/// Fails with a validation error if the model, constants, bundle or
/// reference profile disagree in dimension, and with a configuration error
/// if the solver options are inconsistent (see [`configure`]).
pub fn build(
    model: &dyn Model,
    params: &ParameterBundle,
    constants: &ProcessConstants,
    setup: &Setup,
) -> Result<OcpDescriptor, OcpError> {
    let (nx, nu) = (model.nx(), model.nu());

    check_len(&constants.xs, "xs", nx)?;
    check_len(&constants.us, "us", nu)?;
    check_finite(&constants.xs, "xs")?;
    check_len(&constants.parameters, "parameters", model.np())?;
    check_finite(&constants.parameters, "parameters")?;
    check_dim("Q", nx, params.nx())?;
    check_dim("R", nu, params.nu())?;
    check_dim("P", nx, params.p().nrows())?;
    check_len(params.umin(), "umin", nu)?;
    check_len(params.umax(), "umax", nu)?;

    let options = configure(model, params, setup)?;

    let stage = CostMap::stage(nx, nu);
    let terminal = CostMap::terminal(nx);
    let parameters = constants.parameters.clone();
    let (y_expr, y_expr_e, parameter_values, binding) = match &setup.reference_profile {
        Some(profile) => {
            let adapted = reference::adapt(profile, nx, nu, stage, terminal, parameters)?;
            (
                adapted.stage,
                adapted.terminal,
                adapted.parameters,
                Some(adapted.binding),
            )
        }
        None => (stage, terminal, parameters, None),
    };

    for i in 0..nu {
        if params.umin()[i] > params.umax()[i] {
            warn!(
                "input {} has lbu = {} above ubu = {}",
                i,
                params.umin()[i],
                params.umax()[i]
            );
        }
    }

    let dims = Dims {
        nx,
        nu,
        np: parameter_values.len(),
        ny: y_expr.len(),
        ny_e: y_expr_e.len(),
        nbu: nu,
        n: params.n(),
    };
    let cost = Cost {
        cost_type: CostType::NonlinearLs,
        cost_type_e: CostType::NonlinearLs,
        w: block_diag(params.q(), params.r()),
        w_e: params.p().clone(),
        yref: DVector::zeros(dims.ny),
        yref_e: DVector::zeros(dims.ny_e),
        y_expr,
        y_expr_e,
    };
    let constraints = Constraints {
        lbu: params.umin().clone(),
        ubu: params.umax().clone(),
        idxbu: (0..nu).collect(),
        x0: Some(constants.xs.clone()),
    };

    let ocp = OcpDescriptor {
        model_name: model.name().to_string(),
        dims,
        cost,
        constraints,
        parameter_values,
        reference: binding,
        options,
    };
    ocp.validate()?;

    info!(
        "built OCP for `{}`: nx = {}, nu = {}, np = {}, N = {}, tf = {}",
        ocp.model_name, nx, nu, ocp.dims.np, ocp.dims.n, ocp.options.tf
    );
    Ok(ocp)
}

fn check_dim(field: &'static str, expected: usize, actual: usize) -> Result<(), ValidationError> {
    if expected != actual {
        return Err(ValidationError::Dimension {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}
