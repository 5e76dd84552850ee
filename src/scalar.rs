//! A value that is either a plain constant or a recorded [`Var`].

use core::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::errors::Result;
use crate::ops::{BinaryFn, UnaryFn};
use crate::var::{apply, apply_dv, apply_vd, apply_vv, Var};

/// Constant or differentiable scalar.
///
/// Arithmetic records a node only when at least one operand is
/// [`Scalar::Var`]; constant-only expressions are folded on the spot.
#[derive(Clone, Copy)]
pub enum Scalar<'a> {
    /// A number with no node behind it.
    Constant(f64),
    /// A recorded value.
    Var(Var<'a>),
}

impl<'a> Scalar<'a> {
    /// The current numeric value.
    #[inline]
    pub fn val(&self) -> f64 {
        match self {
            Scalar::Constant(c) => *c,
            Scalar::Var(v) => v.val(),
        }
    }

    /// Whether no node backs this value.
    #[inline]
    pub fn is_constant(&self) -> bool {
        matches!(self, Scalar::Constant(_))
    }

    /// The recorded handle, if any.
    #[inline]
    pub fn as_var(&self) -> Option<Var<'a>> {
        match self {
            Scalar::Constant(_) => None,
            Scalar::Var(v) => Some(*v),
        }
    }

    /// Applies a unary operator, recording a node only for a `Var`.
    #[inline]
    pub fn map<F: UnaryFn>(self) -> Scalar<'a> {
        match self {
            Scalar::Constant(c) => Scalar::Constant(F::f(c)),
            Scalar::Var(v) => Scalar::Var(apply::<F>(v)),
        }
    }

    /// Applies a binary operator, picking the node kind from which operands
    /// are recorded.
    #[inline]
    pub fn zip<F: BinaryFn>(self, rhs: Scalar<'a>) -> Scalar<'a> {
        match (self, rhs) {
            (Scalar::Constant(a), Scalar::Constant(b)) => Scalar::Constant(F::f(a, b)),
            (Scalar::Var(a), Scalar::Constant(b)) => Scalar::Var(apply_vd::<F>(a, b)),
            (Scalar::Constant(a), Scalar::Var(b)) => Scalar::Var(apply_dv::<F>(a, b)),
            (Scalar::Var(a), Scalar::Var(b)) => Scalar::Var(apply_vv::<F>(a, b)),
        }
    }

    /// Gradient with respect to `params`; all zeros for a constant.
    pub fn gradient(&self, params: &[Var<'a>]) -> Result<Vec<f64>> {
        match self {
            Scalar::Constant(_) => Ok(vec![0.0; params.len()]),
            Scalar::Var(v) => v.grad(params),
        }
    }
}

impl From<f64> for Scalar<'_> {
    fn from(c: f64) -> Self {
        Scalar::Constant(c)
    }
}

impl<'a> From<Var<'a>> for Scalar<'a> {
    fn from(v: Var<'a>) -> Self {
        Scalar::Var(v)
    }
}

impl fmt::Debug for Scalar<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Constant(c) => write!(f, "Constant({c})"),
            Scalar::Var(v) => fmt::Debug::fmt(v, f),
        }
    }
}

impl fmt::Display for Scalar<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.val(), f)
    }
}

impl PartialEq for Scalar<'_> {
    fn eq(&self, o: &Self) -> bool {
        self.val() == o.val()
    }
}

impl PartialEq<f64> for Scalar<'_> {
    fn eq(&self, o: &f64) -> bool {
        self.val() == *o
    }
}

// Mixed cases go through the `Var` operators so that identity folding applies.
macro_rules! impl_bin_ops_scalar {
    ($Trait:ident, $func:ident, $sym:tt) => {
        impl<'a> $Trait for Scalar<'a> {
            type Output = Scalar<'a>;
            #[inline]
            fn $func(self, rhs: Scalar<'a>) -> Scalar<'a> {
                match (self, rhs) {
                    (Scalar::Constant(a), Scalar::Constant(b)) => Scalar::Constant(a $sym b),
                    (Scalar::Var(a), Scalar::Constant(b)) => Scalar::Var(a $sym b),
                    (Scalar::Constant(a), Scalar::Var(b)) => Scalar::Var(a $sym b),
                    (Scalar::Var(a), Scalar::Var(b)) => Scalar::Var(a $sym b),
                }
            }
        }
        impl<'a> $Trait<f64> for Scalar<'a> {
            type Output = Scalar<'a>;
            #[inline]
            fn $func(self, rhs: f64) -> Scalar<'a> {
                self $sym Scalar::Constant(rhs)
            }
        }
        impl<'a> $Trait<Scalar<'a>> for f64 {
            type Output = Scalar<'a>;
            #[inline]
            fn $func(self, rhs: Scalar<'a>) -> Scalar<'a> {
                Scalar::Constant(self) $sym rhs
            }
        }
        impl<'a> $Trait<Var<'a>> for Scalar<'a> {
            type Output = Scalar<'a>;
            #[inline]
            fn $func(self, rhs: Var<'a>) -> Scalar<'a> {
                self $sym Scalar::Var(rhs)
            }
        }
        impl<'a> $Trait<Scalar<'a>> for Var<'a> {
            type Output = Scalar<'a>;
            #[inline]
            fn $func(self, rhs: Scalar<'a>) -> Scalar<'a> {
                Scalar::Var(self) $sym rhs
            }
        }
    };
}

impl_bin_ops_scalar!(Add, add, +);
impl_bin_ops_scalar!(Sub, sub, -);
impl_bin_ops_scalar!(Mul, mul, *);
impl_bin_ops_scalar!(Div, div, /);

impl<'a> Neg for Scalar<'a> {
    type Output = Scalar<'a>;
    fn neg(self) -> Scalar<'a> {
        match self {
            Scalar::Constant(c) => Scalar::Constant(-c),
            Scalar::Var(v) => Scalar::Var(-v),
        }
    }
}

/// Extracts the plain value of constants and recorded values alike.
pub trait ValueOf {
    /// The numeric value; never records anything.
    fn value_of(&self) -> f64;
}

impl ValueOf for f64 {
    #[inline]
    fn value_of(&self) -> f64 {
        *self
    }
}

impl ValueOf for Var<'_> {
    #[inline]
    fn value_of(&self) -> f64 {
        self.val()
    }
}

impl ValueOf for Scalar<'_> {
    #[inline]
    fn value_of(&self) -> f64 {
        self.val()
    }
}

impl<T: ValueOf + ?Sized> ValueOf for &T {
    #[inline]
    fn value_of(&self) -> f64 {
        (**self).value_of()
    }
}

/// Free-function form of [`ValueOf::value_of`].
#[inline]
pub fn value_of<T: ValueOf + ?Sized>(x: &T) -> f64 {
    x.value_of()
}
