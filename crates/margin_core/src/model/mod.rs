//! Margin model: the cohort breakdown and the margin definitions searched
//! by the solvers.
//!
//! - `margin`: [`calculate_margins`] and its [`MarginResult`]
//! - `definition`: [`MarginDefinition`], standard or combined margin

pub mod definition;
pub mod margin;

pub use definition::MarginDefinition;
pub use margin::{calculate_margins, MarginResult};
