//! Graph vertices recorded on a [`Stack`](crate::stack::Stack).
//!
//! Every vertex embeds a [`Vari`] (value + adjoint) and implements
//! [`Chainable::chain`], which pushes the vertex's adjoint onto its operands.
//! Operand links are raw pointers into the same arena; they always point at
//! vertices recorded earlier, so a reverse sweep over the node list visits a
//! vertex only after every consumer of it has chained.

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::ops::{BinaryFn, UnaryFn};

/// Value and accumulated adjoint of one vertex.
pub struct Vari {
    val: f64,
    adj: Cell<f64>,
}

impl Vari {
    #[inline]
    pub(crate) fn new(val: f64) -> Self {
        Self {
            val,
            adj: Cell::new(0.0),
        }
    }

    /// The forward value.
    #[inline]
    pub fn val(&self) -> f64 {
        self.val
    }

    /// The adjoint accumulated so far.
    #[inline]
    pub fn adj(&self) -> f64 {
        self.adj.get()
    }

    #[inline]
    pub(crate) fn set_adj(&self, adj: f64) {
        self.adj.set(adj);
    }

    #[inline(always)]
    pub(crate) fn accumulate(&self, delta: f64) {
        self.adj.set(self.adj.get() + delta);
    }
}

impl fmt::Debug for Vari {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Vari {{ addr: {:?}, val: {}, adj: {} }}",
            self as *const Self, self.val, self.adj.get()
        )
    }
}

/// A recorded vertex.
pub trait Chainable {
    /// The embedded value/adjoint pair.
    fn vari(&self) -> &Vari;

    /// Distributes this vertex's adjoint onto its operands.
    fn chain(&self);

    /// Short operation name used by stack listings.
    fn name(&self) -> &'static str;
}

#[inline(always)]
fn operand<'n>(p: NonNull<Vari>) -> &'n Vari {
    // Operands live in the arena that also holds the vertex pointing at them.
    unsafe { p.as_ref() }
}

/// Independent variable or promoted constant.
pub(crate) struct LeafVari {
    base: Vari,
}

impl LeafVari {
    pub(crate) fn new(val: f64) -> Self {
        Self { base: Vari::new(val) }
    }
}

impl Chainable for LeafVari {
    fn vari(&self) -> &Vari {
        &self.base
    }

    fn chain(&self) {}

    fn name(&self) -> &'static str {
        "leaf"
    }
}

/// `f(a)` for a differentiable `a`.
pub(crate) struct UnaryVari<F> {
    base: Vari,
    avi: NonNull<Vari>,
    _f: PhantomData<F>,
}

impl<F: UnaryFn> UnaryVari<F> {
    pub(crate) fn new(avi: &Vari) -> Self {
        Self {
            base: Vari::new(F::f(avi.val())),
            avi: NonNull::from(avi),
            _f: PhantomData,
        }
    }
}

impl<F: UnaryFn> Chainable for UnaryVari<F> {
    fn vari(&self) -> &Vari {
        &self.base
    }

    #[inline]
    fn chain(&self) {
        let a = operand(self.avi);
        a.accumulate(self.base.adj() * F::dx(a.val(), self.base.val()));
    }

    fn name(&self) -> &'static str {
        F::NAME
    }
}

/// `f(a, b)` with both operands differentiable.
pub(crate) struct VvVari<F> {
    base: Vari,
    avi: NonNull<Vari>,
    bvi: NonNull<Vari>,
    _f: PhantomData<F>,
}

impl<F: BinaryFn> VvVari<F> {
    pub(crate) fn new(avi: &Vari, bvi: &Vari) -> Self {
        Self {
            base: Vari::new(F::f(avi.val(), bvi.val())),
            avi: NonNull::from(avi),
            bvi: NonNull::from(bvi),
            _f: PhantomData,
        }
    }
}

impl<F: BinaryFn> Chainable for VvVari<F> {
    fn vari(&self) -> &Vari {
        &self.base
    }

    #[inline]
    fn chain(&self) {
        let (a, b) = (operand(self.avi), operand(self.bvi));
        let (adj, fx) = (self.base.adj(), self.base.val());
        a.accumulate(adj * F::dx1(a.val(), b.val(), fx));
        b.accumulate(adj * F::dx2(a.val(), b.val(), fx));
    }

    fn name(&self) -> &'static str {
        F::NAME
    }
}

/// `f(a, b)` with a differentiable `a` and a constant `b`.
pub(crate) struct VdVari<F> {
    base: Vari,
    avi: NonNull<Vari>,
    bd: f64,
    _f: PhantomData<F>,
}

impl<F: BinaryFn> VdVari<F> {
    pub(crate) fn new(avi: &Vari, bd: f64) -> Self {
        Self {
            base: Vari::new(F::f(avi.val(), bd)),
            avi: NonNull::from(avi),
            bd,
            _f: PhantomData,
        }
    }
}

impl<F: BinaryFn> Chainable for VdVari<F> {
    fn vari(&self) -> &Vari {
        &self.base
    }

    #[inline]
    fn chain(&self) {
        let a = operand(self.avi);
        a.accumulate(self.base.adj() * F::dx1(a.val(), self.bd, self.base.val()));
    }

    fn name(&self) -> &'static str {
        F::NAME
    }
}

/// `f(a, b)` with a constant `a` and a differentiable `b`.
pub(crate) struct DvVari<F> {
    base: Vari,
    ad: f64,
    bvi: NonNull<Vari>,
    _f: PhantomData<F>,
}

impl<F: BinaryFn> DvVari<F> {
    pub(crate) fn new(ad: f64, bvi: &Vari) -> Self {
        Self {
            base: Vari::new(F::f(ad, bvi.val())),
            ad,
            bvi: NonNull::from(bvi),
            _f: PhantomData,
        }
    }
}

impl<F: BinaryFn> Chainable for DvVari<F> {
    fn vari(&self) -> &Vari {
        &self.base
    }

    #[inline]
    fn chain(&self) {
        let b = operand(self.bvi);
        b.accumulate(self.base.adj() * F::dx2(self.ad, b.val(), self.base.val()));
    }

    fn name(&self) -> &'static str {
        F::NAME
    }
}

/// N-ary vertex with precomputed partials, produced by
/// [`OperandsAndPartials`](crate::partials::OperandsAndPartials).
///
/// Both slices are arena-resident and have equal length.
pub(crate) struct PartialsVari {
    base: Vari,
    operands: NonNull<[NonNull<Vari>]>,
    partials: NonNull<[f64]>,
}

impl PartialsVari {
    pub(crate) fn new(val: f64, operands: &[NonNull<Vari>], partials: &[f64]) -> Self {
        debug_assert_eq!(operands.len(), partials.len());
        Self {
            base: Vari::new(val),
            operands: NonNull::from(operands),
            partials: NonNull::from(partials),
        }
    }
}

impl Chainable for PartialsVari {
    fn vari(&self) -> &Vari {
        &self.base
    }

    fn chain(&self) {
        let (operands, partials) = unsafe { (self.operands.as_ref(), self.partials.as_ref()) };
        let adj = self.base.adj();
        for (&vi, &d) in operands.iter().zip(partials) {
            operand(vi).accumulate(adj * d);
        }
    }

    fn name(&self) -> &'static str {
        "partials"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{ExpOp, MulOp, SubOp};

    #[test]
    fn leaf_chain_is_a_no_op() {
        let leaf = LeafVari::new(2.0);
        leaf.base.set_adj(3.0);
        leaf.chain();
        assert_eq!(leaf.vari().adj(), 3.0);
        assert_eq!(leaf.vari().val(), 2.0);
    }

    #[test]
    fn unary_chain_scales_by_local_partial() {
        let x = Vari::new(0.5);
        let y = UnaryVari::<ExpOp>::new(&x);
        y.vari().set_adj(2.0);
        y.chain();
        assert_eq!(x.adj(), 2.0 * 0.5_f64.exp());
    }

    #[test]
    fn binary_chains_touch_only_variable_operands() {
        let a = Vari::new(3.0);
        let b = Vari::new(4.0);

        let vv = VvVari::<MulOp>::new(&a, &b);
        vv.vari().set_adj(1.0);
        vv.chain();
        assert_eq!((a.adj(), b.adj()), (4.0, 3.0));

        let vd = VdVari::<SubOp>::new(&a, 10.0);
        assert_eq!(vd.vari().val(), -7.0);
        vd.vari().set_adj(1.0);
        vd.chain();
        assert_eq!(a.adj(), 5.0);

        let dv = DvVari::<SubOp>::new(10.0, &b);
        dv.vari().set_adj(1.0);
        dv.chain();
        assert_eq!(b.adj(), 2.0);
    }

    #[test]
    fn partials_chain_accumulates_every_operand() {
        let a = Vari::new(1.0);
        let b = Vari::new(2.0);
        let operands = [NonNull::from(&a), NonNull::from(&b), NonNull::from(&a)];
        let partials = [0.5, -1.0, 2.0];
        let node = PartialsVari::new(9.0, &operands, &partials);
        node.vari().set_adj(2.0);
        node.chain();
        assert_eq!(a.adj(), 2.0 * (0.5 + 2.0));
        assert_eq!(b.adj(), -2.0);
    }
}
