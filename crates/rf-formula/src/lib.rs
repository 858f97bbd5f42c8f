//! # rf-formula
//!
//! A ROOT-style symbolic formula engine. Accepts textual expressions like
//! `sin(x)/x`, `[0]*exp(-0.5*((x-[1])/[2])^2)` or `gaus(0)+pol3(2)`, expands
//! the macro shorthands (`polN`, `gaus`/`landau`/`expo` families, `**`/`^`
//! exponentiation, `++` linear composition), resolves every symbol against
//! the variable/parameter/constant/function tables, and compiles the result
//! to a small bytecode evaluated over slot-indexed variable and parameter
//! vectors.
//!
//! ## Example
//!
//! ```
//! use rf_formula::Formula;
//!
//! let mut f = Formula::new("damped", "[0]*sin(x)+[1]*exp(-[2]*x)");
//! assert!(f.ready());
//! f.set_parameters(&[1.0, 2.0, 0.5]);
//! let v = f.eval1(1.0);
//! assert!((v - 2.0545323042).abs() < 1e-9);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bytecode;
pub mod directory;
pub mod formula;
pub mod functor;
pub mod preprocess;
pub mod symbols;
pub mod tmath;

pub use bytecode::CompiledFormula;
pub use formula::Formula;
pub use functor::Functor;
pub use preprocess::{preprocess, Preprocessed};
pub use symbols::{SymbolEntry, SymbolTable};
