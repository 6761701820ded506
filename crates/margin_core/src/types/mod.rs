//! Parameter, variable and error types of the margin model.
//!
//! This module provides:
//! - `params`: [`MarginParameters`] with its [`CompanyCosts`], [`ActivationFee`]
//!   and [`CohortScale`] parts (fractions in `[0, 1]`)
//! - `inputs`: [`MarginInputs`], the percent-form boundary type
//! - `variable`: [`MarginVariable`], the inputs the solvers vary
//! - `error`: [`ModelError`] validation failures

pub mod error;
pub mod inputs;
pub mod params;
pub mod variable;

pub use error::ModelError;
pub use inputs::MarginInputs;
pub use params::{ActivationFee, CohortScale, CompanyCosts, MarginParameters};
pub use variable::MarginVariable;
