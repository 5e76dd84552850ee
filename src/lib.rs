//! Reverse-mode automatic differentiation over scalar values.
//!
//! Arithmetic on [`Var`] handles records one node per operation on a
//! [`Stack`]. A backward sweep over that record, in reverse creation order,
//! yields the gradient of one result with respect to any set of inputs. Node
//! storage comes from a bump arena that is rewound between evaluations, so a
//! warmed-up evaluate/differentiate/recover cycle performs no heap
//! allocation.
//!
//! ```
//! use rev_ad::prelude::*;
//!
//! let mut stack = Stack::new();
//! let grad = stack.scoped(|s| {
//!     let x = s.var(5.0);
//!     let y = s.var(2.0);
//!     let f = (x.exp() + y.exp()).ln();
//!     f.grad(&[x, y])
//! });
//! let grad = grad.unwrap();
//! assert!((grad[0] + grad[1] - 1.0).abs() < 1e-12);
//! ```

pub mod arena;
pub mod check;
pub mod config;
pub mod errors;
pub mod finite_diff;
pub mod functions;
pub mod math;
pub mod node;
pub mod ops;
pub mod partials;
pub mod prelude;
pub mod scalar;
pub mod stack;
pub mod var;
mod overloads;

pub use errors::{AdError, Result};
pub use scalar::{Scalar, ValueOf};
pub use stack::Stack;
pub use var::Var;
