//! # margin_core: Unit-Economics Model for Evaluation Challenges
//!
//! ## Layer 1 (Foundation) Role
//!
//! margin_core is the bottom layer of the margin engine, providing:
//! - Model parameters and their validation (`types::params`)
//! - Percent-form input conversion (`types::inputs`)
//! - The variables searched by the solvers (`types::variable`)
//! - The revenue/cost/margin breakdown (`model::margin`)
//! - Standard and combined margin definitions (`model::definition`)
//!
//! The crate is pure: every function is deterministic and free of I/O, so
//! the solver layer can call it from any thread.
//!
//! ## Usage Examples
//!
//! ```rust
//! use margin_core::model::{calculate_margins, MarginDefinition};
//! use margin_core::types::{MarginParameters, MarginVariable};
//!
//! let params = MarginParameters::new(100.0, 0.05, 5000.0);
//! let result = calculate_margins(&params).unwrap();
//! assert_eq!(result.gross_revenue, 100.0);
//!
//! // Margin as a function of price, other inputs fixed
//! let definition = MarginDefinition::Standard;
//! let margin_at = definition.margin_fn(&params, MarginVariable::EvalPrice);
//! assert!(margin_at(400.0) > margin_at(100.0));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod model;
pub mod types;

pub use model::{calculate_margins, MarginDefinition, MarginResult};
pub use types::{MarginParameters, MarginVariable, ModelError};
