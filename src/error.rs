use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Problem data that fails a dimension, sign or shape check.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field}: expected dimension {expected}, got {actual}")]
    Dimension {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{field}[{index}] is zero and cannot be used for normalization")]
    ZeroEntry { field: &'static str, index: usize },

    #[error("{field}[{index}] is not finite")]
    NotFinite { field: &'static str, index: usize },

    #[error("{field}[({row}, {col})] is not finite")]
    NotFiniteEntry {
        field: &'static str,
        row: usize,
        col: usize,
    },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} must be symmetric")]
    NotSymmetric { field: &'static str },

    #[error("{field} must be positive semi-definite (smallest eigenvalue {eigenvalue})")]
    NotPositiveSemiDefinite { field: &'static str, eigenvalue: f64 },

    #[error("reference profile has no segments")]
    EmptyProfile,

    #[error("no reference profile is bound to this problem")]
    NoReference,

    #[error("initial state constraint x0 is missing")]
    MissingInitialState,

    #[error("{field}: index {index} out of range 0..{len}")]
    OutOfRange {
        field: &'static str,
        index: usize,
        len: usize,
    },
}

/// Option combinations that cannot be solved together.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("cost integration needs an integrator, but linear MPC uses discrete dynamics")]
    DiscreteCostIntegration,

    #[error("model `{model}` has no discrete-time dynamics for linear MPC")]
    MissingDiscreteDynamics { model: String },

    #[error("model `{model}` has no continuous-time dynamics to integrate")]
    MissingContinuousDynamics { model: String },

    #[error("levenberg_marquardt must be finite and non-negative, got {0}")]
    Regularization(f64),

    #[error("nlp_max_iter must be positive")]
    MaxIter,

    #[error("tol must be finite and positive, got {0}")]
    Tolerance(f64),
}

/// Errors raised while building, compiling or running an OCP solver.
#[derive(Debug, Error)]
pub enum OcpError {
    #[error("invalid problem data: {0}")]
    Validation(#[from] ValidationError),

    #[error("inconsistent solver options: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("failed to compile solver for model `{model}`")]
    Compilation {
        model: String,
        #[source]
        source: BoxError,
    },

    #[error("solver failed")]
    Solver(#[source] BoxError),

    #[error("descriptor file i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("descriptor file format: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of an [`OcpError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Configuration,
    Compilation,
    Solver,
    Io,
}

impl OcpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OcpError::Validation(_) => ErrorKind::Validation,
            OcpError::Configuration(_) => ErrorKind::Configuration,
            OcpError::Compilation { .. } => ErrorKind::Compilation,
            OcpError::Solver(_) => ErrorKind::Solver,
            OcpError::Io(_) | OcpError::Json(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn compilation(model: &str, source: impl Into<BoxError>) -> Self {
        OcpError::Compilation {
            model: model.to_string(),
            source: source.into(),
        }
    }
}
