use crate::error::ValidationError;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// A scalar model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbol {
    State(usize),
    Input(usize),
}

/// One entry `y_i` of a least-squares cost map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Residual {
    pub symbol: Symbol,
    /// Component of the active reference segment subtracted from `symbol`.
    pub reference: Option<usize>,
}

/// Nonlinear least-squares cost map `y(x, u, p)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostMap {
    pub residuals: Vec<Residual>,
}

impl CostMap {
    /// `y = [x; u]`.
    pub fn stage(nx: usize, nu: usize) -> Self {
        let residuals = (0..nx)
            .map(Symbol::State)
            .chain((0..nu).map(Symbol::Input))
            .map(|symbol| Residual {
                symbol,
                reference: None,
            })
            .collect();
        Self { residuals }
    }

    /// `y_e = x`.
    pub fn terminal(nx: usize) -> Self {
        Self::stage(nx, 0)
    }

    /// Subtracts reference component `i` from residual `i`.
    pub fn shifted(self) -> Self {
        let residuals = self
            .residuals
            .into_iter()
            .enumerate()
            .map(|(i, r)| Residual {
                symbol: r.symbol,
                reference: Some(i),
            })
            .collect();
        Self { residuals }
    }

    pub fn len(&self) -> usize {
        self.residuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residuals.is_empty()
    }

    pub fn is_shifted(&self) -> bool {
        self.residuals.iter().any(|r| r.reference.is_some())
    }

    /// Evaluates the map. Inputs are taken as zero when `u` is `None`.
    ///
    /// # Errors
    ///
    /// Fails if a residual refers past the end of `x`, `u` or `reference`.
    pub fn evaluate(
        &self,
        x: &DVector<f64>,
        u: Option<&DVector<f64>>,
        reference: Option<&DVector<f64>>,
    ) -> Result<DVector<f64>, ValidationError> {
        let values = self
            .residuals
            .iter()
            .map(|r| -> Result<f64, ValidationError> {
                let value = match (r.symbol, u) {
                    (Symbol::State(i), _) => component(x, "x", i)?,
                    (Symbol::Input(i), Some(u)) => component(u, "u", i)?,
                    (Symbol::Input(_), None) => 0.0,
                };
                match (r.reference, reference) {
                    (Some(k), Some(target)) => Ok(value - component(target, "reference", k)?),
                    _ => Ok(value),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DVector::from_vec(values))
    }
}

fn component(v: &DVector<f64>, field: &'static str, index: usize) -> Result<f64, ValidationError> {
    v.get(index).copied().ok_or(ValidationError::OutOfRange {
        field,
        index,
        len: v.len(),
    })
}
