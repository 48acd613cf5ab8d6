mod builder;
mod common;
mod configure;
mod cost;
pub mod cstr;
mod error;
mod math;
mod ocp;
mod params;
mod reference;
mod solver;
#[cfg(test)]
mod tests;
mod traits;

pub use builder::build;
pub use common::*;
pub use configure::{configure, IRK_STAGES, IRK_STEPS};
pub use cost::*;
pub use error::*;
pub use ocp::*;
pub use params::*;
pub use reference::{ReferenceBinding, ReferenceProfile};
pub use solver::*;
pub use traits::*;
