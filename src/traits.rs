use crate::ocp::OcpDescriptor;
use crate::solver::SolveStatus;
use anyhow::Result;
use nalgebra::DVector;

/// Dynamics model supplied by the symbolic modelling layer.
///
/// Only the dimensions and the available dynamics forms are visible here;
/// the expressions themselves stay with the modelling layer.
pub trait Model {
    fn name(&self) -> &str;

    /// Number of states.
    fn nx(&self) -> usize;

    /// Number of control inputs.
    fn nu(&self) -> usize;

    /// Number of exogenous parameters the dynamics depend on.
    fn np(&self) -> usize;

    /// Provides `dx/dt = f(x, u, p)` for an integrator.
    fn has_continuous_dynamics(&self) -> bool {
        true
    }

    /// Provides a pre-discretized map `x+ = f(x, u, p)`.
    fn has_discrete_dynamics(&self) -> bool {
        false
    }
}

/// Generates and builds a solver for an OCP descriptor.
pub trait Engine {
    fn compile(&self, ocp: &OcpDescriptor) -> Result<Box<dyn CompiledSolver>>;
}

/// Runtime values passed to a compiled solver on every call.
pub struct SolveInput<'a> {
    pub x0: &'a DVector<f64>,
    pub parameters: &'a DVector<f64>,
    /// Least-squares targets for stages `0..=N`.
    pub yref: &'a [DVector<f64>],
}

/// Engine-reported outcome of a single solve.
pub struct EngineOutput {
    /// First control action of the optimal trajectory.
    pub u0: DVector<f64>,
    pub exit: crate::solver::ExitStatus,
    pub iterations: usize,
}

/// A compiled solver. Holds no per-loop state, so it can be shared between handles.
pub trait CompiledSolver: Send + Sync {
    fn solve(&self, input: &SolveInput) -> Result<EngineOutput>;
}

/// Called after every solve with the control cycle index and the solver status.
pub trait SolveMonitor {
    fn update(&self, cycle: usize, status: &SolveStatus);
}
