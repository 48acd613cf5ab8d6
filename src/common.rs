use crate::reference::ReferenceProfile;
use serde::{Deserialize, Serialize};

/// Transcription of the dynamics over one shooting interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Integrator {
    /// The model is already a discrete-time map `x+ = f(x, u, p)`.
    Discrete,
    /// Implicit Runge-Kutta (collocation) integrator.
    #[serde(rename = "IRK")]
    ImplicitRungeKutta { stages: usize, steps: usize },
}

impl Integrator {
    pub fn name(&self) -> &'static str {
        match self {
            Integrator::Discrete => "DISCRETE",
            Integrator::ImplicitRungeKutta { .. } => "IRK",
        }
    }
}

/// QP subsolver used inside each SQP iteration.
///
/// All backends solve the same QP; the choice only affects performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QpSolver {
    /// Interior point on a partially condensed QP.
    PartialCondensingHpipm,
    /// Interior point on the fully condensed QP.
    FullCondensingHpipm,
    /// Active set on the fully condensed QP.
    FullCondensingQpoases,
    /// Dual Newton strategy on a partially condensed QP.
    PartialCondensingQpdunes,
    /// ADMM on a partially condensed QP.
    PartialCondensingOsqp,
}

impl QpSolver {
    pub fn is_partial_condensing(&self) -> bool {
        matches!(
            self,
            QpSolver::PartialCondensingHpipm
                | QpSolver::PartialCondensingQpdunes
                | QpSolver::PartialCondensingOsqp
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HessianApprox {
    GaussNewton,
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NlpSolverType {
    /// Iterate to convergence on every call.
    Sqp,
    /// One real-time iteration per call.
    SqpRti,
}

/// How the stage cost is evaluated over a shooting interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostDiscretization {
    /// Sampled once at the start of the interval.
    Euler,
    /// Integrated over the interval alongside the dynamics.
    Integrator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostType {
    NonlinearLs,
}

/// Options block of an OCP descriptor, read by the external engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Number of shooting intervals.
    pub n_horizon: usize,
    /// Prediction horizon in seconds.
    pub tf: f64,

    pub integrator: Integrator,

    pub qp_solver: QpSolver,
    /// Horizon of the partially condensed QP.
    pub qp_solver_cond_n: usize,

    pub hessian_approx: HessianApprox,
    /// Levenberg-Marquardt term added to the Gauss-Newton Hessian.
    pub levenberg_marquardt: f64,

    pub nlp_solver_type: NlpSolverType,
    /// Iteration limit for `Sqp`.
    pub nlp_max_iter: usize,
    /// Termination tolerance for `Sqp`.
    pub tol: f64,

    pub cost_discretization: CostDiscretization,
}

/// Controller tuning used to derive a [`ParameterBundle`](crate::ParameterBundle).
#[derive(Debug, Clone, PartialEq)]
pub struct Tuning {
    /// Sampling period of the control loop in seconds.
    pub dt: f64,
    /// Use a pre-discretized (linearized) model.
    pub linear_mpc: bool,
    /// Number of shooting intervals.
    pub n: usize,
    /// Prediction horizon in seconds.
    pub tf: f64,

    /// Lower input bound as a multiple of the steady-state input.
    pub input_lower_scale: f64,
    /// Upper input bound per channel as a multiple of the steady-state input.
    pub input_upper_scale: Vec<f64>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            dt: 0.25,
            linear_mpc: false,
            n: 16,
            tf: 4.0,

            input_lower_scale: 0.95,
            input_upper_scale: vec![1.05, 1.15],
        }
    }
}

/// Choices made when assembling and configuring the OCP.
#[derive(Debug, Clone, PartialEq)]
pub struct Setup {
    /// Take a single real-time iteration per solve.
    pub use_rti: bool,
    /// Re-centre the least-squares cost around this profile.
    pub reference_profile: Option<ReferenceProfile>,
    /// Integrate the stage cost over each interval.
    pub cost_integration: bool,

    pub qp_solver: QpSolver,
    pub levenberg_marquardt: f64,
    pub nlp_max_iter: usize,
    pub tol: f64,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            use_rti: false,
            reference_profile: None,
            cost_integration: false,

            qp_solver: QpSolver::PartialCondensingHpipm,
            levenberg_marquardt: 1e-5,
            nlp_max_iter: 100,
            tol: 1e-6,
        }
    }
}
