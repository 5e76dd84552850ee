//! One N-ary node for functions of many mixed arguments.
//!
//! A density such as `normal_log(y, mu, sigma)` may take any mix of constants
//! and recorded values, each a scalar or a vector. Recording it operator by
//! operator would create a node per intermediate; instead the function
//! computes its value and partials by hand and records a single
//! [`PartialsVari`](crate::node::PartialsVari):
//!
//! ```
//! use rev_ad::prelude::*;
//!
//! let stack = Stack::new();
//! let mu = stack.var(0.5);
//! let ys = [1.0_f64, 2.0, 3.0];
//!
//! let mut ops = OperandsAndPartials::new(&[&ys, &mu]);
//! let mut logp = 0.0;
//! for (n, y) in ys.iter().enumerate() {
//!     let z = y - mu.val();
//!     logp -= 0.5 * z * z;
//!     ops.d_x(1)[n] += z;
//! }
//! let lp = ops.to_var(logp);
//! assert_eq!(lp.gradient(&[mu]).unwrap(), vec![0.5 + 1.5 + 2.5]);
//! ```

use std::ops::{Index, IndexMut};
use std::ptr::{self, NonNull};

use smallvec::SmallVec;

use crate::node::{PartialsVari, Vari};
use crate::scalar::Scalar;
use crate::stack::Stack;
use crate::var::Var;

mod sealed {
    pub trait Sealed {}
}

/// An argument accepted by [`OperandsAndPartials`].
///
/// Implemented for `f64`, [`Var`], [`Scalar`], and for slices, arrays and
/// vectors of `f64` or `Var`. A slice is passed by double reference
/// (`&&xs[..]`) since `[T]` itself cannot become a trait object.
pub trait Operand<'a>: sealed::Sealed {
    /// Number of scalar elements.
    fn size(&self) -> usize;

    /// Whether partials are indexed per element rather than broadcast.
    fn is_vector(&self) -> bool;

    /// Whether no element is recorded.
    fn is_constant(&self) -> bool;

    /// Value of element `n`; scalars ignore the index.
    fn value_at(&self, n: usize) -> f64;

    /// The stack of the recorded elements, if any.
    fn stack(&self) -> Option<&'a Stack>;

    /// Whether every recorded element lives on `stack`.
    fn on_stack(&self, stack: &Stack) -> bool {
        self.stack().map_or(true, |s| ptr::eq(s, stack))
    }

    /// Writes the node of each element into `out`, which holds exactly
    /// [`size`](Operand::size) slots. Never called on constants.
    fn write_varis(&self, out: &mut [NonNull<Vari>]);
}

impl sealed::Sealed for f64 {}
impl<'a> Operand<'a> for f64 {
    fn size(&self) -> usize {
        1
    }
    fn is_vector(&self) -> bool {
        false
    }
    fn is_constant(&self) -> bool {
        true
    }
    fn value_at(&self, _n: usize) -> f64 {
        *self
    }
    fn stack(&self) -> Option<&'a Stack> {
        None
    }
    fn write_varis(&self, _out: &mut [NonNull<Vari>]) {}
}

impl sealed::Sealed for Var<'_> {}
impl<'a> Operand<'a> for Var<'a> {
    fn size(&self) -> usize {
        1
    }
    fn is_vector(&self) -> bool {
        false
    }
    fn is_constant(&self) -> bool {
        false
    }
    fn value_at(&self, _n: usize) -> f64 {
        self.val()
    }
    fn stack(&self) -> Option<&'a Stack> {
        Some(Var::stack(self))
    }
    fn write_varis(&self, out: &mut [NonNull<Vari>]) {
        out[0] = NonNull::from(self.vari());
    }
}

impl sealed::Sealed for Scalar<'_> {}
impl<'a> Operand<'a> for Scalar<'a> {
    fn size(&self) -> usize {
        1
    }
    fn is_vector(&self) -> bool {
        false
    }
    fn is_constant(&self) -> bool {
        Scalar::is_constant(self)
    }
    fn value_at(&self, _n: usize) -> f64 {
        self.val()
    }
    fn stack(&self) -> Option<&'a Stack> {
        self.as_var().map(|v| v.stack())
    }
    fn write_varis(&self, out: &mut [NonNull<Vari>]) {
        if let Scalar::Var(v) = self {
            out[0] = NonNull::from(v.vari());
        }
    }
}

impl sealed::Sealed for [f64] {}
impl<'a> Operand<'a> for [f64] {
    fn size(&self) -> usize {
        self.len()
    }
    fn is_vector(&self) -> bool {
        true
    }
    fn is_constant(&self) -> bool {
        true
    }
    fn value_at(&self, n: usize) -> f64 {
        self[n]
    }
    fn stack(&self) -> Option<&'a Stack> {
        None
    }
    fn write_varis(&self, _out: &mut [NonNull<Vari>]) {}
}

impl sealed::Sealed for [Var<'_>] {}
impl<'a> Operand<'a> for [Var<'a>] {
    fn size(&self) -> usize {
        self.len()
    }
    fn is_vector(&self) -> bool {
        true
    }
    fn is_constant(&self) -> bool {
        false
    }
    fn value_at(&self, n: usize) -> f64 {
        self[n].val()
    }
    fn stack(&self) -> Option<&'a Stack> {
        self.first().map(|v| v.stack())
    }
    fn on_stack(&self, stack: &Stack) -> bool {
        self.iter().all(|v| ptr::eq(v.stack(), stack))
    }
    fn write_varis(&self, out: &mut [NonNull<Vari>]) {
        for (slot, v) in out.iter_mut().zip(self) {
            *slot = NonNull::from(v.vari());
        }
    }
}

macro_rules! delegate_operand {
    ($lt:lifetime, $Inner:ty) => {
        fn size(&self) -> usize {
            <$Inner as Operand<$lt>>::size(self)
        }
        fn is_vector(&self) -> bool {
            true
        }
        fn is_constant(&self) -> bool {
            <$Inner as Operand<$lt>>::is_constant(self)
        }
        fn value_at(&self, n: usize) -> f64 {
            <$Inner as Operand<$lt>>::value_at(self, n)
        }
        fn stack(&self) -> Option<&$lt Stack> {
            <$Inner as Operand<$lt>>::stack(self)
        }
        fn on_stack(&self, stack: &Stack) -> bool {
            <$Inner as Operand<$lt>>::on_stack(self, stack)
        }
        fn write_varis(&self, out: &mut [NonNull<Vari>]) {
            <$Inner as Operand<$lt>>::write_varis(self, out)
        }
    };
}

impl sealed::Sealed for Vec<f64> {}
impl<'a> Operand<'a> for Vec<f64> {
    delegate_operand!('a, [f64]);
}

impl sealed::Sealed for Vec<Var<'_>> {}
impl<'a> Operand<'a> for Vec<Var<'a>> {
    delegate_operand!('a, [Var<'a>]);
}

impl<const N: usize> sealed::Sealed for [f64; N] {}
impl<'a, const N: usize> Operand<'a> for [f64; N] {
    delegate_operand!('a, [f64]);
}

impl<const N: usize> sealed::Sealed for [Var<'_>; N] {}
impl<'a, const N: usize> Operand<'a> for [Var<'a>; N] {
    delegate_operand!('a, [Var<'a>]);
}

impl<T: sealed::Sealed + ?Sized> sealed::Sealed for &T {}
impl<'a, T: Operand<'a> + ?Sized> Operand<'a> for &T {
    fn size(&self) -> usize {
        (**self).size()
    }
    fn is_vector(&self) -> bool {
        (**self).is_vector()
    }
    fn is_constant(&self) -> bool {
        (**self).is_constant()
    }
    fn value_at(&self, n: usize) -> f64 {
        (**self).value_at(n)
    }
    fn stack(&self) -> Option<&'a Stack> {
        (**self).stack()
    }
    fn on_stack(&self, stack: &Stack) -> bool {
        (**self).on_stack(stack)
    }
    fn write_varis(&self, out: &mut [NonNull<Vari>]) {
        (**self).write_varis(out)
    }
}

#[derive(Clone, Copy, Debug)]
struct Slot {
    offset: usize,
    len: usize,
    broadcast: bool,
}

/// Collects the operands of one N-ary function and the partials written
/// against them, then records them as a single node.
///
/// Partials live in the stack's arena, laid out argument after argument;
/// constant arguments take no room.
pub struct OperandsAndPartials<'a> {
    stack: Option<&'a Stack>,
    varis: &'a [NonNull<Vari>],
    partials: &'a mut [f64],
    slots: SmallVec<[Slot; 6]>,
}

impl<'a> OperandsAndPartials<'a> {
    /// Lays out partial storage for `operands`, in order.
    ///
    /// # Panics
    /// If the recorded operands come from more than one stack.
    pub fn new(operands: &[&dyn Operand<'a>]) -> Self {
        let stack = operands.iter().find_map(|op| op.stack());
        let mut slots: SmallVec<[Slot; 6]> = SmallVec::with_capacity(operands.len());
        let mut total = 0;
        for op in operands {
            let len = if op.is_constant() { 0 } else { op.size() };
            slots.push(Slot {
                offset: total,
                len,
                broadcast: !op.is_vector(),
            });
            total += len;
        }

        let (varis, partials) = match stack {
            Some(stack) if total > 0 => {
                assert!(
                    operands.iter().all(|op| op.on_stack(stack)),
                    "operands recorded on different stacks"
                );
                let arena = stack.arena();
                let varis = arena.alloc_slice_fill_copy(total, NonNull::<Vari>::dangling());
                for (op, slot) in operands.iter().zip(&slots) {
                    if slot.len > 0 {
                        op.write_varis(&mut varis[slot.offset..slot.offset + slot.len]);
                    }
                }
                (&*varis, arena.alloc_slice_fill_copy(total, 0.0))
            }
            _ => (Default::default(), Default::default()),
        };

        Self {
            stack,
            varis,
            partials,
            slots,
        }
    }

    /// Number of arguments.
    pub fn num_operands(&self) -> usize {
        self.slots.len()
    }

    /// Total number of recorded elements across all arguments.
    pub fn len(&self) -> usize {
        self.varis.len()
    }

    /// Whether no argument has a recorded element; [`to_var`](Self::to_var)
    /// will then return a constant.
    pub fn is_empty(&self) -> bool {
        self.varis.is_empty()
    }

    /// Partials view of argument `i`.
    ///
    /// # Panics
    /// If `i` is not below [`num_operands`](Self::num_operands).
    pub fn d_x(&mut self, i: usize) -> Partials<'_> {
        let slot = self.slots[i];
        Partials {
            slice: &mut self.partials[slot.offset..slot.offset + slot.len],
            broadcast: slot.broadcast,
            sink: 0.0,
        }
    }

    /// Records one node of value `value` over every recorded element, or
    /// returns `value` as a constant when there is none.
    pub fn to_var(self, value: f64) -> Scalar<'a> {
        match self.stack {
            Some(stack) if !self.varis.is_empty() => {
                let vi = stack.push(PartialsVari::new(value, self.varis, self.partials));
                Scalar::Var(Var::from_vari(stack, vi))
            }
            _ => Scalar::Constant(value),
        }
    }
}

/// Writable partials of one argument.
///
/// Scalar arguments map every index to their single slot, so vectorised
/// loops can accumulate into them with the element index. Constant
/// arguments have no slots and silently drop writes.
pub struct Partials<'p> {
    slice: &'p mut [f64],
    broadcast: bool,
    sink: f64,
}

impl Partials<'_> {
    /// Whether writes are dropped.
    pub fn is_constant(&self) -> bool {
        self.slice.is_empty()
    }

    /// Number of backing slots.
    pub fn len(&self) -> usize {
        self.slice.len()
    }

    /// Whether there are no backing slots.
    pub fn is_empty(&self) -> bool {
        self.slice.is_empty()
    }

    #[inline]
    fn slot(&self, n: usize) -> usize {
        if self.broadcast {
            0
        } else {
            n
        }
    }

    /// Adds `d` to the partial of element `n`.
    #[inline]
    pub fn add(&mut self, n: usize, d: f64) {
        if !self.slice.is_empty() {
            let k = self.slot(n);
            self.slice[k] += d;
        }
    }

    /// Overwrites the partial of element `n`.
    #[inline]
    pub fn set(&mut self, n: usize, d: f64) {
        if !self.slice.is_empty() {
            let k = self.slot(n);
            self.slice[k] = d;
        }
    }

    /// Current partial of element `n`; zero for constants.
    #[inline]
    pub fn get(&self, n: usize) -> f64 {
        if self.slice.is_empty() {
            0.0
        } else {
            self.slice[self.slot(n)]
        }
    }

    /// The backing slots.
    pub fn as_slice(&self) -> &[f64] {
        self.slice
    }
}

impl Index<usize> for Partials<'_> {
    type Output = f64;

    fn index(&self, n: usize) -> &f64 {
        if self.slice.is_empty() {
            &self.sink
        } else {
            &self.slice[self.slot(n)]
        }
    }
}

impl IndexMut<usize> for Partials<'_> {
    fn index_mut(&mut self, n: usize) -> &mut f64 {
        if self.slice.is_empty() {
            &mut self.sink
        } else {
            let k = self.slot(n);
            &mut self.slice[k]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_arguments_take_no_slots() {
        let stack = Stack::new();
        let x = stack.var(1.0);
        let before = stack.len();
        let c = [1.0_f64, 2.0];
        let mut ops = OperandsAndPartials::new(&[&2.0_f64, &c, &x]);
        assert_eq!(ops.num_operands(), 3);
        assert_eq!(ops.len(), 1);
        assert!(ops.d_x(0).is_constant());
        assert!(ops.d_x(1).is_constant());
        assert!(!ops.d_x(2).is_constant());
        assert_eq!(stack.len(), before);
    }

    #[test]
    fn all_constant_yields_a_constant() {
        let stack = Stack::new();
        let _x = stack.var(1.0);
        let before = stack.len();
        let ys = vec![1.0_f64, 2.0];
        let mut ops = OperandsAndPartials::new(&[&ys, &3.0_f64, &Scalar::Constant(4.0)]);
        assert!(ops.is_empty());
        ops.d_x(0)[1] += 5.0;
        ops.d_x(1).add(0, 5.0);
        assert_eq!(ops.d_x(0).get(1), 0.0);
        let out = ops.to_var(-1.5);
        assert!(out.is_constant());
        assert_eq!(out.val(), -1.5);
        assert_eq!(stack.len(), before);
    }

    #[test]
    fn scalar_argument_broadcasts_every_index() {
        let stack = Stack::new();
        let mu = stack.var(0.0);
        let mut ops = OperandsAndPartials::new(&[&mu]);
        for n in 0..4 {
            ops.d_x(0)[n] += 1.5;
        }
        assert_eq!(ops.d_x(0).as_slice(), &[6.0]);
        let out = ops.to_var(0.0);
        assert_eq!(out.gradient(&[mu]).unwrap(), vec![6.0]);
    }

    #[test]
    fn vector_arguments_are_laid_out_in_order() {
        let stack = Stack::new();
        let xs = stack.vars(&[1.0, 2.0, 3.0]);
        let s = stack.var(10.0);
        let ys = [xs[2], xs[0]];
        let mut ops = OperandsAndPartials::new(&[&xs, &0.5_f64, &s, &ys]);
        assert_eq!(ops.len(), 6);
        for n in 0..3 {
            ops.d_x(0).set(n, n as f64 + 1.0);
        }
        ops.d_x(2).add(0, -1.0);
        ops.d_x(3)[0] = 100.0;
        ops.d_x(3)[1] = 1000.0;

        let before = stack.len();
        let out = ops.to_var(42.0);
        assert_eq!(stack.len(), before + 1);
        assert_eq!(out.val(), 42.0);

        let mut params = xs.clone();
        params.push(s);
        let g = out.gradient(&params).unwrap();
        assert_eq!(g, vec![1001.0, 2.0, 103.0, -1.0]);
    }

    #[test]
    fn recorded_scalar_argument() {
        let stack = Stack::new();
        let x = stack.var(2.0);
        let sx = Scalar::from(x);
        let mut ops = OperandsAndPartials::new(&[&sx, &Scalar::Constant(1.0)]);
        ops.d_x(0)[0] = 3.0;
        assert_eq!(ops.to_var(0.0).gradient(&[x]).unwrap(), vec![3.0]);
    }

    #[test]
    #[should_panic(expected = "different stacks")]
    fn mixed_stacks_panic() {
        let a = Stack::new();
        let b = Stack::new();
        let xs = vec![a.var(1.0), b.var(1.0)];
        let _ = OperandsAndPartials::new(&[&xs]);
    }
}
