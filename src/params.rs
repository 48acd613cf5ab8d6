use crate::common::Tuning;
use crate::error::ValidationError;
use crate::math::{check_finite, check_positive, check_weight, inverse_square_diag};
use log::{debug, warn};
use nalgebra::{DMatrix, DVector};

/// Steady state and exogenous parameters of the controlled process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessConstants {
    /// Steady-state state.
    pub xs: DVector<f64>,
    /// Steady-state input.
    pub us: DVector<f64>,
    /// Nominal values of the model's exogenous parameters.
    pub parameters: DVector<f64>,
}

impl ProcessConstants {
    pub fn new(xs: DVector<f64>, us: DVector<f64>, parameters: DVector<f64>) -> Self {
        Self { xs, us, parameters }
    }
}

/// Normalized cost and bound data for one controller configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBundle {
    umin: DVector<f64>,
    umax: DVector<f64>,
    q: DMatrix<f64>,
    r: DMatrix<f64>,
    p: DMatrix<f64>,
    tf: f64,
    n: usize,
    dt: f64,
    linear_mpc: bool,
}

impl ParameterBundle {
    /// Derives weights and input bounds from the steady state `xs`, `us`.
    ///
    /// `Q = diag(1/xs^2)` and `R = diag(1/us^2)`, so every state and input
    /// contributes unit cost at a deviation equal to its nominal value. The
    /// terminal weight `p` comes from an offline LQR design and is only
    /// checked, never recomputed.
    ///
    /// # Errors
    ///
    /// Fails if `xs` or `us` has a zero or non-finite entry, if the horizon,
    /// horizon time or sampling period is not positive, or if `p` is not an
    /// `nx`x`nx` symmetric positive semi-definite matrix.
    pub fn derive(
        xs: &DVector<f64>,
        us: &DVector<f64>,
        p: DMatrix<f64>,
        tuning: &Tuning,
    ) -> Result<Self, ValidationError> {
        if tuning.n == 0 {
            return Err(ValidationError::NotPositive {
                field: "N",
                value: 0.0,
            });
        }
        check_positive(tuning.tf, "Tf")?;
        check_positive(tuning.dt, "dt")?;

        let q = inverse_square_diag(xs, "xs")?;
        let r = inverse_square_diag(us, "us")?;
        check_weight(&p, "P", xs.len())?;

        let nu = us.len();
        if tuning.input_upper_scale.len() != nu {
            return Err(ValidationError::Dimension {
                field: "input_upper_scale",
                expected: nu,
                actual: tuning.input_upper_scale.len(),
            });
        }
        let lower = DVector::from_element(nu, tuning.input_lower_scale);
        let upper = DVector::from_column_slice(&tuning.input_upper_scale);
        check_finite(&lower, "input_lower_scale")?;
        check_finite(&upper, "input_upper_scale")?;
        let umin = lower.component_mul(us);
        let umax = upper.component_mul(us);

        let interval = tuning.tf / tuning.n as f64;
        if (interval - tuning.dt).abs() > 1e-9 * tuning.dt {
            warn!(
                "shooting interval Tf/N = {} differs from sampling period dt = {}",
                interval, tuning.dt
            );
        }
        debug!("umin = {:?}, umax = {:?}", umin.as_slice(), umax.as_slice());

        Ok(Self {
            umin,
            umax,
            q,
            r,
            p,
            tf: tuning.tf,
            n: tuning.n,
            dt: tuning.dt,
            linear_mpc: tuning.linear_mpc,
        })
    }

    pub fn umin(&self) -> &DVector<f64> {
        &self.umin
    }

    pub fn umax(&self) -> &DVector<f64> {
        &self.umax
    }

    /// Stage state weight.
    pub fn q(&self) -> &DMatrix<f64> {
        &self.q
    }

    /// Stage input weight.
    pub fn r(&self) -> &DMatrix<f64> {
        &self.r
    }

    /// Terminal state weight.
    pub fn p(&self) -> &DMatrix<f64> {
        &self.p
    }

    pub fn tf(&self) -> f64 {
        self.tf
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn linear_mpc(&self) -> bool {
        self.linear_mpc
    }

    pub fn nx(&self) -> usize {
        self.q.nrows()
    }

    pub fn nu(&self) -> usize {
        self.r.nrows()
    }
}
