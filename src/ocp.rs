use crate::common::{CostType, SolverOptions};
use crate::cost::{CostMap, Symbol};
use crate::error::{OcpError, ValidationError};
use crate::math::{check_finite, check_len, check_positive, check_weight};
use crate::reference::ReferenceBinding;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Problem dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dims {
    pub nx: usize,
    pub nu: usize,
    /// Number of runtime parameters, including a reference selector.
    pub np: usize,
    /// Length of the stage cost map.
    pub ny: usize,
    /// Length of the terminal cost map.
    pub ny_e: usize,
    /// Number of bounded inputs.
    pub nbu: usize,
    /// Number of shooting intervals.
    pub n: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cost {
    pub cost_type: CostType,
    pub cost_type_e: CostType,
    /// Stage cost map `y(x, u, p)`.
    pub y_expr: CostMap,
    /// Terminal cost map `y_e(x, p)`.
    pub y_expr_e: CostMap,
    pub w: DMatrix<f64>,
    pub w_e: DMatrix<f64>,
    pub yref: DVector<f64>,
    pub yref_e: DVector<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub lbu: DVector<f64>,
    pub ubu: DVector<f64>,
    /// Input components the bounds apply to.
    pub idxbu: Vec<usize>,
    /// Initial state equality constraint. Overwritten before each solve.
    pub x0: Option<DVector<f64>>,
}

/// A complete optimal control problem, ready to be compiled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcpDescriptor {
    pub model_name: String,
    pub dims: Dims,
    pub cost: Cost,
    pub constraints: Constraints,
    /// Nominal runtime parameter values.
    pub parameter_values: DVector<f64>,
    pub reference: Option<ReferenceBinding>,
    pub options: SolverOptions,
}

impl OcpDescriptor {
    /// Checks that every block agrees with `dims`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let d = &self.dims;
        let opts = &self.options;

        if d.n == 0 || opts.n_horizon == 0 {
            return Err(ValidationError::NotPositive {
                field: "N",
                value: 0.0,
            });
        }
        if opts.n_horizon != d.n {
            return Err(ValidationError::Dimension {
                field: "n_horizon",
                expected: d.n,
                actual: opts.n_horizon,
            });
        }
        check_positive(opts.tf, "tf")?;
        if opts.qp_solver.is_partial_condensing()
            && !(1..=d.n).contains(&opts.qp_solver_cond_n)
        {
            return Err(ValidationError::OutOfRange {
                field: "qp_solver_cond_n",
                index: opts.qp_solver_cond_n,
                len: d.n + 1,
            });
        }

        let cost = &self.cost;
        check_map(&cost.y_expr, "y_expr", d.ny, d.nx, d.nu)?;
        check_map(&cost.y_expr_e, "y_expr_e", d.ny_e, d.nx, 0)?;
        check_weight(&cost.w, "W", d.ny)?;
        check_weight(&cost.w_e, "W_e", d.ny_e)?;
        check_len(&cost.yref, "yref", d.ny)?;
        check_len(&cost.yref_e, "yref_e", d.ny_e)?;

        let cons = &self.constraints;
        check_len(&cons.lbu, "lbu", d.nbu)?;
        check_len(&cons.ubu, "ubu", d.nbu)?;
        check_finite(&cons.lbu, "lbu")?;
        check_finite(&cons.ubu, "ubu")?;
        if cons.idxbu.len() != d.nbu {
            return Err(ValidationError::Dimension {
                field: "idxbu",
                expected: d.nbu,
                actual: cons.idxbu.len(),
            });
        }
        if let Some(&index) = cons.idxbu.iter().find(|&&i| i >= d.nu) {
            return Err(ValidationError::OutOfRange {
                field: "idxbu",
                index,
                len: d.nu,
            });
        }
        let x0 = cons.x0.as_ref().ok_or(ValidationError::MissingInitialState)?;
        check_len(x0, "x0", d.nx)?;

        check_len(&self.parameter_values, "parameter_values", d.np)?;
        let shifted = cost.y_expr.is_shifted() || cost.y_expr_e.is_shifted();
        match &self.reference {
            Some(binding) => {
                if binding.selector >= d.np {
                    return Err(ValidationError::OutOfRange {
                        field: "reference selector",
                        index: binding.selector,
                        len: d.np,
                    });
                }
                if binding.profile.segments().is_empty() {
                    return Err(ValidationError::EmptyProfile);
                }
                for segment in binding.profile.segments() {
                    check_len(segment, "reference_profile", d.nx + d.nu)?;
                    check_finite(segment, "reference_profile")?;
                }
            }
            None if shifted => return Err(ValidationError::NoReference),
            None => {}
        }

        Ok(())
    }

    /// Stage residual `y(x, u, p) - yref` at the given point.
    pub fn stage_residual(
        &self,
        x: &DVector<f64>,
        u: &DVector<f64>,
        p: &DVector<f64>,
    ) -> Result<DVector<f64>, ValidationError> {
        check_len(x, "x", self.dims.nx)?;
        check_len(u, "u", self.dims.nu)?;
        check_len(p, "p", self.dims.np)?;
        let target = self.reference.as_ref().map(|r| r.target(p)).transpose()?;
        let y = self.cost.y_expr.evaluate(x, Some(u), target)?;
        check_len(&self.cost.yref, "yref", y.len())?;
        Ok(y - &self.cost.yref)
    }

    /// Terminal residual `y_e(x, p) - yref_e`.
    pub fn terminal_residual(
        &self,
        x: &DVector<f64>,
        p: &DVector<f64>,
    ) -> Result<DVector<f64>, ValidationError> {
        check_len(x, "x", self.dims.nx)?;
        check_len(p, "p", self.dims.np)?;
        let target = self.reference.as_ref().map(|r| r.target(p)).transpose()?;
        let y = self.cost.y_expr_e.evaluate(x, None, target)?;
        check_len(&self.cost.yref_e, "yref_e", y.len())?;
        Ok(y - &self.cost.yref_e)
    }

    /// Stage cost `0.5 * r' W r` of the stage residual `r`.
    pub fn stage_cost(
        &self,
        x: &DVector<f64>,
        u: &DVector<f64>,
        p: &DVector<f64>,
    ) -> Result<f64, ValidationError> {
        let r = self.stage_residual(x, u, p)?;
        half_quadratic(&self.cost.w, &r, "W")
    }

    /// Terminal cost `0.5 * r' W_e r`.
    pub fn terminal_cost(
        &self,
        x: &DVector<f64>,
        p: &DVector<f64>,
    ) -> Result<f64, ValidationError> {
        let r = self.terminal_residual(x, p)?;
        half_quadratic(&self.cost.w_e, &r, "W_e")
    }

    /// Writes the descriptor as pretty-printed JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), OcpError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads and validates a descriptor written by [`write_json`](Self::write_json).
    pub fn read_json(path: impl AsRef<Path>) -> Result<Self, OcpError> {
        let reader = BufReader::new(File::open(path)?);
        let ocp: Self = serde_json::from_reader(reader)?;
        ocp.validate()?;
        Ok(ocp)
    }
}

/// `0.5 * r' w r`.
fn half_quadratic(
    w: &DMatrix<f64>,
    r: &DVector<f64>,
    field: &'static str,
) -> Result<f64, ValidationError> {
    if w.shape() != (r.len(), r.len()) {
        return Err(ValidationError::Dimension {
            field,
            expected: r.len(),
            actual: if w.nrows() != r.len() { w.nrows() } else { w.ncols() },
        });
    }
    Ok(0.5 * r.dot(&(w * r)))
}

fn check_map(
    map: &CostMap,
    field: &'static str,
    ny: usize,
    nx: usize,
    nu: usize,
) -> Result<(), ValidationError> {
    if map.len() != ny {
        return Err(ValidationError::Dimension {
            field,
            expected: ny,
            actual: map.len(),
        });
    }
    for r in &map.residuals {
        let (index, len) = match r.symbol {
            Symbol::State(i) => (i, nx),
            Symbol::Input(i) => (i, nu),
        };
        if index >= len {
            return Err(ValidationError::OutOfRange { field, index, len });
        }
        if let Some(k) = r.reference {
            if k >= nx + nu {
                return Err(ValidationError::OutOfRange {
                    field,
                    index: k,
                    len: nx + nu,
                });
            }
        }
    }
    Ok(())
}
