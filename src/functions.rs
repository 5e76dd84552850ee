//! Differentiable elementary functions.
//!
//! Every function is available as a method on [`Var`], named like its `f64`
//! counterpart where one exists. The binary functions also exist as free
//! functions over [`Scalar`], which covers the constant-first cases
//! (`pow(2.0, x)`) and folds constant-only calls.

use crate::math;
use crate::ops::*;
use crate::partials::OperandsAndPartials;
use crate::scalar::Scalar;
use crate::var::{apply, apply_vd, apply_vv, Var};

macro_rules! unary_methods {
    ($($(#[$m:meta])* $name:ident => $Op:ty;)*) => {
        impl<'a> Var<'a> {
            $(
                $(#[$m])*
                #[inline]
                pub fn $name(self) -> Var<'a> {
                    apply::<$Op>(self)
                }
            )*
        }
    };
}

unary_methods! {
    /// `e^x`.
    exp => ExpOp;
    /// `2^x`.
    exp2 => Exp2Op;
    /// `e^x - 1`, accurate near zero.
    exp_m1 => Expm1Op;
    /// Same as [`exp_m1`](Var::exp_m1).
    expm1 => Expm1Op;
    /// Natural logarithm.
    ln => LogOp;
    /// Same as [`ln`](Var::ln).
    log => LogOp;
    log2 => Log2Op;
    log10 => Log10Op;
    /// `ln(1 + x)`, accurate near zero.
    ln_1p => Log1pOp;
    /// Same as [`ln_1p`](Var::ln_1p).
    log1p => Log1pOp;
    /// `ln(1 - x)`.
    log1m => Log1mOp;
    sqrt => SqrtOp;
    cbrt => CbrtOp;
    /// `x * x` as one node.
    square => SquareOp;
    /// `1 / x` as one node.
    inv => InvOp;
    sin => SinOp;
    cos => CosOp;
    tan => TanOp;
    asin => AsinOp;
    acos => AcosOp;
    atan => AtanOp;
    sinh => SinhOp;
    cosh => CoshOp;
    tanh => TanhOp;
    asinh => AsinhOp;
    acosh => AcoshOp;
    atanh => AtanhOp;
    /// `|x|`; the derivative at zero is taken as zero.
    abs => AbsOp;
    /// Same as [`abs`](Var::abs).
    fabs => AbsOp;
    /// Rounding functions record a node whose derivative is zero.
    floor => FloorOp;
    ceil => CeilOp;
    round => RoundOp;
    trunc => TruncOp;
    logit => LogitOp;
    inv_logit => InvLogitOp;
    inv_cloglog => InvCloglogOp;
    /// `ln(1 + e^x)` without overflow.
    log1p_exp => Log1pExpOp;
    log_inv_logit => LogInvLogitOp;
}

macro_rules! binary_methods {
    ($($(#[$m:meta])* $name:ident => $Op:ty;)*) => {
        impl<'a> Var<'a> {
            $(
                $(#[$m])*
                #[inline]
                pub fn $name(self, rhs: impl Into<Scalar<'a>>) -> Var<'a> {
                    match rhs.into() {
                        Scalar::Var(b) => apply_vv::<$Op>(self, b),
                        Scalar::Constant(b) => apply_vd::<$Op>(self, b),
                    }
                }
            )*
        }

        $(
            $(#[$m])*
            #[inline]
            pub fn $name<'a>(a: impl Into<Scalar<'a>>, b: impl Into<Scalar<'a>>) -> Scalar<'a> {
                a.into().zip::<$Op>(b.into())
            }
        )*
    };
}

binary_methods! {
    /// `self` raised to `rhs`.
    pow => PowOp;
    /// Euclidean norm `sqrt(a² + b²)`.
    hypot => HypotOp;
    /// Four-quadrant arctangent of `self / rhs`.
    atan2 => Atan2Op;
    /// Larger operand; a NaN loses.
    fmax => FmaxOp;
    /// Smaller operand; a NaN loses.
    fmin => FminOp;
    /// `max(a - b, 0)`.
    fdim => FdimOp;
    /// Remainder with the sign of the dividend.
    fmod => FmodOp;
    /// `ln(e^a + e^b)` without overflow.
    log_sum_exp => LogSumExpOp;
}

impl<'a> Var<'a> {
    /// `self` raised to a constant power.
    #[inline]
    pub fn powf(self, p: f64) -> Var<'a> {
        apply_vd::<PowOp>(self, p)
    }

    /// `self` raised to an integer power.
    #[inline]
    pub fn powi(self, n: i32) -> Var<'a> {
        apply_vd::<PowOp>(self, f64::from(n))
    }
}

/// Sum of `xs` as a single node; a constant zero for an empty slice.
pub fn sum<'a>(xs: &[Var<'a>]) -> Scalar<'a> {
    let mut ops = OperandsAndPartials::new(&[&xs]);
    let mut total = 0.0;
    let mut d = ops.d_x(0);
    for (n, x) in xs.iter().enumerate() {
        total += x.val();
        d[n] = 1.0;
    }
    ops.to_var(total)
}

/// `ln(Σ e^x)` over `xs` as a single node; `-inf` for an empty slice.
///
/// Elements equal to `-inf` contribute nothing to the value and get a zero
/// partial.
pub fn log_sum_exp_slice<'a>(xs: &[Var<'a>]) -> Scalar<'a> {
    let lse = math::log_sum_exp_iter(xs.iter().map(Var::val));
    let mut ops = OperandsAndPartials::new(&[&xs]);
    if lse != f64::NEG_INFINITY {
        let mut d = ops.d_x(0);
        for (n, x) in xs.iter().enumerate() {
            d[n] = (x.val() - lse).exp();
        }
    }
    ops.to_var(lse)
}
