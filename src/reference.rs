//! Re-centring of the least-squares cost around a reference profile.
//!
//! The profile is a list of piecewise-constant target segments, each of
//! length `nx + nu`. One runtime parameter, the selector `s`, picks the
//! active segment: segment `clamp(floor(s), 0, len - 1)`. With a single
//! segment the selector has no effect.

use crate::cost::CostMap;
use crate::error::ValidationError;
use crate::math::{check_finite, check_len};
use log::debug;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceProfile {
    segments: Vec<DVector<f64>>,
}

impl ReferenceProfile {
    /// A single target held over the whole horizon.
    pub fn constant(target: DVector<f64>) -> Self {
        Self {
            segments: vec![target],
        }
    }

    /// Segments selected at runtime by the selector parameter.
    ///
    /// # Errors
    ///
    /// Fails if `segments` is empty, the segments differ in length or any
    /// entry is not finite.
    pub fn piecewise(segments: Vec<DVector<f64>>) -> Result<Self, ValidationError> {
        let first = segments.first().ok_or(ValidationError::EmptyProfile)?;
        let len = first.len();
        for segment in &segments {
            check_len(segment, "reference_profile", len)?;
            check_finite(segment, "reference_profile")?;
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[DVector<f64>] {
        &self.segments
    }

    /// Length of each target.
    pub fn target_len(&self) -> usize {
        self.segments.first().map_or(0, |s| s.len())
    }

    /// Returns the segment picked by `selector`.
    pub fn select(&self, selector: f64) -> &DVector<f64> {
        let last = self.segments.len().saturating_sub(1);
        let index = if selector.is_nan() {
            0
        } else {
            selector.max(0.0).floor().min(last as f64) as usize
        };
        &self.segments[index]
    }

    fn validate(&self, nx: usize, nu: usize) -> Result<(), ValidationError> {
        if self.segments.is_empty() {
            return Err(ValidationError::EmptyProfile);
        }
        for segment in &self.segments {
            check_len(segment, "reference_profile", nx + nu)?;
            check_finite(segment, "reference_profile")?;
        }
        Ok(())
    }
}

/// A reference profile bound to a slot of the runtime parameter vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceBinding {
    pub profile: ReferenceProfile,
    /// Index of the selector in the runtime parameter vector.
    pub selector: usize,
}

impl ReferenceBinding {
    /// The target active for the runtime parameters `p`.
    ///
    /// # Errors
    ///
    /// Fails if the selector slot lies outside `p` or the profile is empty.
    pub fn target(&self, p: &DVector<f64>) -> Result<&DVector<f64>, ValidationError> {
        let selector = p.get(self.selector).ok_or(ValidationError::OutOfRange {
            field: "reference selector",
            index: self.selector,
            len: p.len(),
        })?;
        if self.profile.segments.is_empty() {
            return Err(ValidationError::EmptyProfile);
        }
        Ok(self.profile.select(*selector))
    }
}

/// Output of [`adapt`].
pub(crate) struct Adapted {
    pub stage: CostMap,
    pub terminal: CostMap,
    pub parameters: DVector<f64>,
    pub binding: ReferenceBinding,
}

/// Shifts the stage map by the profile and the terminal map by its first
/// `nx` entries, and appends the selector slot to `parameters`.
pub(crate) fn adapt(
    profile: &ReferenceProfile,
    nx: usize,
    nu: usize,
    stage: CostMap,
    terminal: CostMap,
    parameters: DVector<f64>,
) -> Result<Adapted, ValidationError> {
    profile.validate(nx, nu)?;

    let selector = parameters.len();
    let parameters = DVector::from_iterator(
        selector + 1,
        parameters.iter().copied().chain(std::iter::once(0.0)),
    );
    debug!(
        "reference profile with {} segment(s), selector at p[{}]",
        profile.segments.len(),
        selector
    );

    Ok(Adapted {
        stage: stage.shifted(),
        terminal: terminal.shifted(),
        parameters,
        binding: ReferenceBinding {
            profile: profile.clone(),
            selector,
        },
    })
}
