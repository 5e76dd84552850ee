//! The user-facing differentiable scalar.

use core::fmt;
use std::cmp::Ordering;
use std::ops::Not;
use std::ptr;

use crate::errors::Result;
use crate::node::{DvVari, UnaryVari, Vari, VdVari, VvVari};
use crate::ops::{BinaryFn, UnaryFn};
use crate::stack::Stack;

/// A scalar recorded on a [`Stack`].
///
/// Copying a `Var` copies the reference, never the node. Arithmetic on `Var`s
/// records new nodes on the same stack; comparisons only look at values and
/// record nothing, so branching on them is invisible to the gradient.
#[derive(Clone, Copy)]
pub struct Var<'a> {
    stack: &'a Stack,
    vi: &'a Vari,
}

impl<'a> Var<'a> {
    #[inline]
    pub(crate) fn from_vari(stack: &'a Stack, vi: &'a Vari) -> Self {
        Self { stack, vi }
    }

    /// The stack this value was recorded on.
    #[inline]
    pub fn stack(&self) -> &'a Stack {
        self.stack
    }

    #[inline]
    pub(crate) fn vari(&self) -> &'a Vari {
        self.vi
    }

    /// Returns the stored scalar value.
    #[inline]
    pub fn val(&self) -> f64 {
        self.vi.val()
    }

    /// Alias for [`val`](Var::val).
    #[inline]
    pub fn value(&self) -> f64 {
        self.val()
    }

    /// Returns the accumulated adjoint; meaningful after a backward sweep
    /// over a graph containing this value.
    #[inline]
    pub fn adj(&self) -> f64 {
        self.vi.adj()
    }

    /// Alias for [`adj`](Var::adj).
    #[inline]
    pub fn adjoint(&self) -> f64 {
        self.adj()
    }

    /// Gradient of `self` with respect to `params`.
    pub fn grad(&self, params: &[Var<'a>]) -> Result<Vec<f64>> {
        self.stack.gradient(*self, params)
    }

    #[inline]
    pub(crate) fn same_stack(&self, other: &Var<'_>) -> bool {
        ptr::eq(self.stack, other.stack)
    }
}

impl fmt::Debug for Var<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Var({}, adj: {}, node: {:?})", self.val(), self.adj(), self.vi as *const Vari)
    }
}

impl fmt::Display for Var<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.val(), f)
    }
}

/// Records `F(x)`.
#[inline]
pub fn apply<'a, F: UnaryFn>(x: Var<'a>) -> Var<'a> {
    Var::from_vari(x.stack, x.stack.push(UnaryVari::<F>::new(x.vi)))
}

/// Records `F(a, b)` with both operands differentiable.
///
/// # Panics
/// If `a` and `b` were recorded on different stacks.
#[inline]
pub fn apply_vv<'a, F: BinaryFn>(a: Var<'a>, b: Var<'a>) -> Var<'a> {
    assert!(a.same_stack(&b), "operands recorded on different stacks");
    Var::from_vari(a.stack, a.stack.push(VvVari::<F>::new(a.vi, b.vi)))
}

/// Records `F(a, b)` with a constant `b`.
#[inline]
pub fn apply_vd<'a, F: BinaryFn>(a: Var<'a>, b: f64) -> Var<'a> {
    Var::from_vari(a.stack, a.stack.push(VdVari::<F>::new(a.vi, b)))
}

/// Records `F(a, b)` with a constant `a`.
#[inline]
pub fn apply_dv<'a, F: BinaryFn>(a: f64, b: Var<'a>) -> Var<'a> {
    Var::from_vari(b.stack, b.stack.push(DvVari::<F>::new(a, b.vi)))
}

impl PartialEq for Var<'_> {
    fn eq(&self, o: &Self) -> bool {
        self.val() == o.val()
    }
}

impl PartialOrd for Var<'_> {
    fn partial_cmp(&self, o: &Self) -> Option<Ordering> {
        self.val().partial_cmp(&o.val())
    }
}

impl PartialEq<f64> for Var<'_> {
    fn eq(&self, o: &f64) -> bool {
        self.val() == *o
    }
}

impl PartialOrd<f64> for Var<'_> {
    fn partial_cmp(&self, o: &f64) -> Option<Ordering> {
        self.val().partial_cmp(o)
    }
}

impl PartialEq<Var<'_>> for f64 {
    fn eq(&self, o: &Var<'_>) -> bool {
        *self == o.val()
    }
}

impl PartialOrd<Var<'_>> for f64 {
    fn partial_cmp(&self, o: &Var<'_>) -> Option<Ordering> {
        self.partial_cmp(&o.val())
    }
}

/// `!x` is `x == 0`.
impl Not for Var<'_> {
    type Output = bool;
    fn not(self) -> bool {
        self.val() == 0.0
    }
}
