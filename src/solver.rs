use crate::common::SolverOptions;
use crate::error::{OcpError, ValidationError};
use crate::math::{check_finite, check_len};
use crate::ocp::{Cost, Dims, OcpDescriptor};
use crate::reference::ReferenceBinding;
use crate::traits::{CompiledSolver, Engine, SolveInput, SolveMonitor};
use log::{debug, info, warn};
use nalgebra::DVector;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Converged, or completed its single real-time iteration.
    Converged,
    MaxIterations,
    QpFailure,
    NumericalFailure,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveStatus {
    pub exit: ExitStatus,
    pub iterations: usize,
    /// Wall time of the call.
    pub elapsed: Duration,
}

impl SolveStatus {
    pub fn converged(&self) -> bool {
        self.exit == ExitStatus::Converged
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Control action to apply now.
    pub u0: DVector<f64>,
    pub status: SolveStatus,
}

/// Compiles `ocp` with `engine`.
///
/// # Errors
///
/// Fails with a compilation error if the descriptor is structurally invalid
/// or the engine rejects it.
pub fn compile(ocp: OcpDescriptor, engine: &dyn Engine) -> Result<SolverHandle, OcpError> {
    ocp.validate()
        .map_err(|e| OcpError::compilation(&ocp.model_name, e))?;
    let solver = engine
        .compile(&ocp)
        .map_err(|e| OcpError::compilation(&ocp.model_name, e))?;
    info!("compiled solver for `{}`", ocp.model_name);
    Ok(SolverHandle::new(Arc::new(ocp), Arc::from(solver)))
}

/// A compiled solver together with the runtime state of one control loop.
pub struct SolverHandle {
    ocp: Arc<OcpDescriptor>,
    solver: Arc<dyn CompiledSolver>,
    x0: DVector<f64>,
    parameters: DVector<f64>,
    yref: Vec<DVector<f64>>,
    cycle: usize,
    monitor: Option<Box<dyn SolveMonitor>>,
}

impl SolverHandle {
    fn new(ocp: Arc<OcpDescriptor>, solver: Arc<dyn CompiledSolver>) -> Self {
        let n = ocp.dims.n;
        let mut yref = vec![ocp.cost.yref.clone(); n];
        yref.push(ocp.cost.yref_e.clone());
        // validated before compilation
        let x0 = ocp
            .constraints
            .x0
            .clone()
            .unwrap_or_else(|| DVector::zeros(ocp.dims.nx));

        Self {
            x0,
            parameters: ocp.parameter_values.clone(),
            yref,
            cycle: 0,
            monitor: None,
            ocp,
            solver,
        }
    }

    pub fn descriptor(&self) -> &OcpDescriptor {
        &self.ocp
    }

    pub fn initial_state(&self) -> &DVector<f64> {
        &self.x0
    }

    /// Sets the measured state the next solve starts from.
    pub fn set_initial_state(&mut self, x0: &[f64]) -> Result<(), ValidationError> {
        let x0 = DVector::from_column_slice(x0);
        check_len(&x0, "x0", self.ocp.dims.nx)?;
        check_finite(&x0, "x0")?;
        self.x0 = x0;
        Ok(())
    }

    pub fn parameters(&self) -> &DVector<f64> {
        &self.parameters
    }

    /// Replaces all runtime parameters, reference selector included.
    pub fn set_parameters(&mut self, p: &[f64]) -> Result<(), ValidationError> {
        let p = DVector::from_column_slice(p);
        check_len(&p, "p", self.ocp.dims.np)?;
        check_finite(&p, "p")?;
        self.parameters = p;
        Ok(())
    }

    pub fn set_parameter(&mut self, index: usize, value: f64) -> Result<(), ValidationError> {
        if index >= self.parameters.len() {
            return Err(ValidationError::OutOfRange {
                field: "p",
                index,
                len: self.parameters.len(),
            });
        }
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field: "p", index });
        }
        self.parameters[index] = value;
        Ok(())
    }

    /// Picks the active reference segment.
    pub fn set_reference_selector(&mut self, selector: f64) -> Result<(), ValidationError> {
        let index = self
            .ocp
            .reference
            .as_ref()
            .ok_or(ValidationError::NoReference)?
            .selector;
        self.set_parameter(index, selector)
    }

    /// Sets the least-squares target of `stage`; stage `N` is the terminal stage.
    pub fn set_yref(&mut self, stage: usize, yref: &[f64]) -> Result<(), ValidationError> {
        let n = self.ocp.dims.n;
        if stage > n {
            return Err(ValidationError::OutOfRange {
                field: "stage",
                index: stage,
                len: n + 1,
            });
        }
        let yref = DVector::from_column_slice(yref);
        if stage == n {
            check_len(&yref, "yref_e", self.ocp.dims.ny_e)?;
        } else {
            check_len(&yref, "yref", self.ocp.dims.ny)?;
        }
        check_finite(&yref, "yref")?;
        self.yref[stage] = yref;
        Ok(())
    }

    pub fn yref(&self, stage: usize) -> Option<&DVector<f64>> {
        self.yref.get(stage)
    }

    pub fn set_monitor(&mut self, monitor: Box<dyn SolveMonitor>) {
        self.monitor = Some(monitor);
    }

    /// Number of completed solves.
    pub fn cycles(&self) -> usize {
        self.cycle
    }

    /// Solves the OCP from the current initial state.
    pub fn solve(&mut self) -> Result<Solution, OcpError> {
        let input = SolveInput {
            x0: &self.x0,
            parameters: &self.parameters,
            yref: &self.yref,
        };

        let start = Instant::now();
        let out = self.solver.solve(&input).map_err(|e| OcpError::Solver(e.into()))?;
        let elapsed = start.elapsed();

        if out.u0.len() != self.ocp.dims.nu {
            return Err(OcpError::Solver(
                ValidationError::Dimension {
                    field: "u0",
                    expected: self.ocp.dims.nu,
                    actual: out.u0.len(),
                }
                .into(),
            ));
        }

        let status = SolveStatus {
            exit: out.exit,
            iterations: out.iterations,
            elapsed,
        };
        if !status.converged() {
            warn!("cycle {}: solver exited with {:?}", self.cycle, status.exit);
        }
        debug!(
            "cycle {}: {} iteration(s) in {:?}",
            self.cycle, status.iterations, status.elapsed
        );
        if let Some(monitor) = self.monitor.as_ref() {
            monitor.update(self.cycle, &status);
        }
        self.cycle += 1;

        Ok(Solution { u0: out.u0, status })
    }
}

/// Compiles each distinct problem structure once and hands out handles that
/// share the compiled solver.
///
/// Problems differing only in `x0` or nominal parameter values share an entry.
pub struct SolverCache<'a> {
    engine: &'a dyn Engine,
    compiled: HashMap<String, Arc<dyn CompiledSolver>>,
}

#[derive(Serialize)]
struct CacheKey<'a> {
    model_name: &'a str,
    dims: &'a Dims,
    cost: &'a Cost,
    lbu: &'a DVector<f64>,
    ubu: &'a DVector<f64>,
    idxbu: &'a [usize],
    reference: &'a Option<ReferenceBinding>,
    options: &'a SolverOptions,
}

impl<'a> SolverCache<'a> {
    pub fn new(engine: &'a dyn Engine) -> Self {
        Self {
            engine,
            compiled: HashMap::new(),
        }
    }

    /// Returns a fresh handle for `ocp`, compiling only on a cache miss.
    pub fn handle(&mut self, ocp: OcpDescriptor) -> Result<SolverHandle, OcpError> {
        ocp.validate()
            .map_err(|e| OcpError::compilation(&ocp.model_name, e))?;
        let key = serde_json::to_string(&CacheKey {
            model_name: &ocp.model_name,
            dims: &ocp.dims,
            cost: &ocp.cost,
            lbu: &ocp.constraints.lbu,
            ubu: &ocp.constraints.ubu,
            idxbu: &ocp.constraints.idxbu,
            reference: &ocp.reference,
            options: &ocp.options,
        })?;

        let solver = match self.compiled.get(&key) {
            Some(solver) => {
                debug!("reusing compiled solver for `{}`", ocp.model_name);
                Arc::clone(solver)
            }
            None => {
                let solver: Arc<dyn CompiledSolver> = Arc::from(
                    self.engine
                        .compile(&ocp)
                        .map_err(|e| OcpError::compilation(&ocp.model_name, e))?,
                );
                info!("compiled solver for `{}`", ocp.model_name);
                self.compiled.insert(key, Arc::clone(&solver));
                solver
            }
        };

        Ok(SolverHandle::new(Arc::new(ocp), solver))
    }

    /// Number of compiled solvers held.
    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}
