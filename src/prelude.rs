//! Everything needed to record and differentiate a function.

pub use crate::check::*;
pub use crate::config::StackConfig;
pub use crate::errors::AdError;
pub use crate::functions::*;
pub use crate::ops::{BinaryFn, UnaryFn};
pub use crate::partials::{Operand, OperandsAndPartials, Partials};
pub use crate::scalar::{value_of, Scalar, ValueOf};
pub use crate::stack::Stack;
pub use crate::var::{apply, apply_dv, apply_vd, apply_vv, Var};
