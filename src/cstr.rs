//! Continuous stirred-tank reactor benchmark.
//!
//! States are the outlet concentration `c`, the reactor temperature `T` and
//! the liquid level `h`. Inputs are the coolant temperature `Tc` and the
//! outlet flow `F`. The inlet flow `F0` enters as a runtime parameter.

use crate::builder::build;
use crate::common::{Setup, Tuning};
use crate::error::OcpError;
use crate::ocp::OcpDescriptor;
use crate::params::{ParameterBundle, ProcessConstants};
use crate::traits::Model;
use nalgebra::{DMatrix, DVector};

pub const STATE_NAMES: [&str; 3] = ["c", "T", "h"];
pub const INPUT_NAMES: [&str; 2] = ["Tc", "F"];
pub const PARAMETER_NAMES: [&str; 1] = ["F0"];

/// Nominal inlet flow.
pub const F0: f64 = 0.1;

/// The reactor model as exposed by the modelling layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CstrModel {
    linearized: bool,
}

impl CstrModel {
    /// Nonlinear continuous-time dynamics.
    pub fn nonlinear() -> Self {
        Self { linearized: false }
    }

    /// Discrete-time linearization about the steady state.
    pub fn linearized() -> Self {
        Self { linearized: true }
    }
}

impl Model for CstrModel {
    fn name(&self) -> &str {
        if self.linearized {
            "cstr_linearized"
        } else {
            "cstr"
        }
    }

    fn nx(&self) -> usize {
        STATE_NAMES.len()
    }

    fn nu(&self) -> usize {
        INPUT_NAMES.len()
    }

    fn np(&self) -> usize {
        PARAMETER_NAMES.len()
    }

    fn has_continuous_dynamics(&self) -> bool {
        !self.linearized
    }

    fn has_discrete_dynamics(&self) -> bool {
        self.linearized
    }
}

/// Steady state of the reactor at the nominal inlet flow.
pub fn nominal_constants() -> ProcessConstants {
    ProcessConstants::new(
        DVector::from_vec(vec![0.878, 324.5, 0.659]),
        DVector::from_vec(vec![300.0, 0.1]),
        DVector::from_vec(vec![F0]),
    )
}

/// LQR terminal weight for the linearized reactor at the nominal steady state.
#[rustfmt::skip]
pub fn terminal_weight() -> DMatrix<f64> {
    DMatrix::from_row_slice(3, 3, &[
        5.92981953e-01, -8.40033347e-04, -1.54536980e-02,
        -8.40033347e-04, 7.75225208e-06, 2.30677411e-05,
        -1.54536980e-02, 2.30677411e-05, 2.59450075e00,
    ])
}

/// Builds the reactor OCP about the nominal steady state.
pub fn setup_ocp(
    model: &CstrModel,
    tuning: &Tuning,
    setup: &Setup,
) -> Result<OcpDescriptor, OcpError> {
    let constants = nominal_constants();
    let params = ParameterBundle::derive(&constants.xs, &constants.us, terminal_weight(), tuning)?;
    build(model, &params, &constants, setup)
}
