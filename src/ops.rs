//! Value and local-partial formulas for every differentiable operator.
//!
//! Each operator is a zero-sized marker implementing [`UnaryFn`] or
//! [`BinaryFn`]. The node kinds in [`node`](crate::node) are generic over
//! these markers, so adding an operator means adding one marker; the
//! `apply*` entry points in [`var`](crate::var) accept user-defined markers as
//! well.

use std::f64::consts::{LN_10, LN_2};

use crate::math;

/// A unary operation definition.
pub trait UnaryFn: 'static {
    /// Name shown in stack listings.
    const NAME: &'static str;
    /// Evaluates the operator.
    fn f(x: f64) -> f64;
    /// Derivative at `x`, given `fx = f(x)`.
    fn dx(x: f64, fx: f64) -> f64;
}

/// A binary operation definition.
pub trait BinaryFn: 'static {
    /// Name shown in stack listings.
    const NAME: &'static str;
    /// Evaluates the operator.
    fn f(x1: f64, x2: f64) -> f64;
    /// Derivative with respect to the first operand, given `fx = f(x1, x2)`.
    fn dx1(x1: f64, x2: f64, fx: f64) -> f64;
    /// Derivative with respect to the second operand, given `fx = f(x1, x2)`.
    fn dx2(x1: f64, x2: f64, fx: f64) -> f64;
}

macro_rules! un_op {
    ($name:ident, $label:literal, $doc:expr, $eval:expr, $d:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug)]
        pub struct $name;
        impl UnaryFn for $name {
            const NAME: &'static str = $label;
            #[inline]
            fn f(x: f64) -> f64 {
                $eval(x)
            }
            #[inline]
            fn dx(x: f64, fx: f64) -> f64 {
                $d(x, fx)
            }
        }
    };
}

macro_rules! bin_op {
    ($name:ident, $label:literal, $doc:expr, $eval:expr, $d1:expr, $d2:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug)]
        pub struct $name;
        impl BinaryFn for $name {
            const NAME: &'static str = $label;
            #[inline]
            fn f(x1: f64, x2: f64) -> f64 {
                $eval(x1, x2)
            }
            #[inline]
            fn dx1(x1: f64, x2: f64, fx: f64) -> f64 {
                $d1(x1, x2, fx)
            }
            #[inline]
            fn dx2(x1: f64, x2: f64, fx: f64) -> f64 {
                $d2(x1, x2, fx)
            }
        }
    };
}

fn sign_or_zero(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else if x == 0.0 {
        0.0
    } else {
        f64::NAN
    }
}

un_op!(NegOp, "neg", "Negation.", |x: f64| -x, |_, _| -1.0);
un_op!(ExpOp, "exp", "Exponential.", f64::exp, |_, fx| fx);
un_op!(Exp2Op, "exp2", "Base-2 exponential.", f64::exp2, |_, fx: f64| fx * LN_2);
un_op!(Expm1Op, "expm1", "`exp(x) - 1`.", f64::exp_m1, |_, fx: f64| fx + 1.0);
un_op!(LogOp, "log", "Natural logarithm.", f64::ln, |x: f64, _| 1.0 / x);
un_op!(Log2Op, "log2", "Base-2 logarithm.", f64::log2, |x: f64, _| 1.0 / (x * LN_2));
un_op!(Log10Op, "log10", "Base-10 logarithm.", f64::log10, |x: f64, _| 1.0 / (x * LN_10));
un_op!(Log1pOp, "log1p", "`ln(1 + x)`.", f64::ln_1p, |x: f64, _| 1.0 / (1.0 + x));
un_op!(Log1mOp, "log1m", "`ln(1 - x)`.", math::log1m, |x: f64, _| -1.0 / (1.0 - x));
un_op!(SqrtOp, "sqrt", "Square root.", f64::sqrt, |_, fx: f64| 0.5 / fx);
un_op!(CbrtOp, "cbrt", "Cube root.", f64::cbrt, |_, fx: f64| 1.0 / (3.0 * fx * fx));
un_op!(SquareOp, "square", "`x * x`.", |x: f64| x * x, |x: f64, _| 2.0 * x);
un_op!(InvOp, "inv", "Reciprocal.", |x: f64| 1.0 / x, |_, fx: f64| -fx * fx);
un_op!(SinOp, "sin", "Sine.", f64::sin, |x: f64, _| x.cos());
un_op!(CosOp, "cos", "Cosine.", f64::cos, |x: f64, _| -x.sin());
un_op!(TanOp, "tan", "Tangent.", f64::tan, |_, fx: f64| 1.0 + fx * fx);
un_op!(AsinOp, "asin", "Arcsine.", f64::asin, |x: f64, _| 1.0 / (1.0 - x * x).sqrt());
un_op!(AcosOp, "acos", "Arccosine.", f64::acos, |x: f64, _| -1.0 / (1.0 - x * x).sqrt());
un_op!(AtanOp, "atan", "Arctangent.", f64::atan, |x: f64, _| 1.0 / (1.0 + x * x));
un_op!(SinhOp, "sinh", "Hyperbolic sine.", f64::sinh, |x: f64, _| x.cosh());
un_op!(CoshOp, "cosh", "Hyperbolic cosine.", f64::cosh, |x: f64, _| x.sinh());
un_op!(TanhOp, "tanh", "Hyperbolic tangent.", f64::tanh, |_, fx: f64| 1.0 - fx * fx);
un_op!(AsinhOp, "asinh", "Inverse hyperbolic sine.", f64::asinh, |x: f64, _| 1.0 / (x * x + 1.0).sqrt());
un_op!(AcoshOp, "acosh", "Inverse hyperbolic cosine.", f64::acosh, |x: f64, _| 1.0 / (x * x - 1.0).sqrt());
un_op!(AtanhOp, "atanh", "Inverse hyperbolic tangent.", f64::atanh, |x: f64, _| 1.0 / (1.0 - x * x));
un_op!(AbsOp, "abs", "Absolute value; the derivative at zero is zero.", f64::abs, |x: f64, _| sign_or_zero(x));
un_op!(FloorOp, "floor", "Round down; piecewise constant.", f64::floor, |_, _| 0.0);
un_op!(CeilOp, "ceil", "Round up; piecewise constant.", f64::ceil, |_, _| 0.0);
un_op!(RoundOp, "round", "Round half away from zero; piecewise constant.", f64::round, |_, _| 0.0);
un_op!(TruncOp, "trunc", "Round toward zero; piecewise constant.", f64::trunc, |_, _| 0.0);
un_op!(LogitOp, "logit", "Log odds.", math::logit, |x: f64, _| 1.0 / (x * (1.0 - x)));
un_op!(InvLogitOp, "inv_logit", "Logistic sigmoid.", math::inv_logit, |_, fx: f64| fx * (1.0 - fx));
un_op!(InvCloglogOp, "inv_cloglog", "Inverse complementary log-log.", math::inv_cloglog, |x: f64, _| (x - x.exp()).exp());
un_op!(Log1pExpOp, "log1p_exp", "`ln(1 + exp(x))`.", math::log1p_exp, |x: f64, _| math::inv_logit(x));
un_op!(LogInvLogitOp, "log_inv_logit", "`ln(inv_logit(x))`.", math::log_inv_logit, |x: f64, _| math::inv_logit(-x));

bin_op!(AddOp, "add", "Binary addition.", |a: f64, b: f64| a + b, |_, _, _| 1.0, |_, _, _| 1.0);
bin_op!(SubOp, "sub", "Binary subtraction.", |a: f64, b: f64| a - b, |_, _, _| 1.0, |_, _, _| -1.0);
bin_op!(MulOp, "mul", "Binary multiplication.", |a: f64, b: f64| a * b, |_, b: f64, _| b, |a: f64, _, _| a);
bin_op!(
    DivOp,
    "div",
    "Binary division.",
    |a: f64, b: f64| a / b,
    |_, b: f64, _| 1.0 / b,
    |_, b: f64, fx: f64| -fx / b
);
bin_op!(
    PowOp,
    "pow",
    "Power; the exponent partial is zero when the base is zero.",
    f64::powf,
    |a: f64, b: f64, _| b * a.powf(b - 1.0),
    |a: f64, _, fx: f64| if a == 0.0 { 0.0 } else { fx * a.ln() }
);
bin_op!(
    HypotOp,
    "hypot",
    "Euclidean norm of two values.",
    f64::hypot,
    |a: f64, _, fx: f64| a / fx,
    |_, b: f64, fx: f64| b / fx
);
bin_op!(
    Atan2Op,
    "atan2",
    "Four-quadrant arctangent of `y / x`.",
    f64::atan2,
    |y: f64, x: f64, _| x / (x * x + y * y),
    |y: f64, x: f64, _| -y / (x * x + y * y)
);
bin_op!(
    FmaxOp,
    "fmax",
    "Larger operand; the adjoint goes to the selected operand only.",
    math::fmax,
    |a: f64, b: f64, _| if fmax_picks_first(a, b) { 1.0 } else { 0.0 },
    |a: f64, b: f64, _| if fmax_picks_first(a, b) { 0.0 } else { 1.0 }
);
bin_op!(
    FminOp,
    "fmin",
    "Smaller operand; the adjoint goes to the selected operand only.",
    math::fmin,
    |a: f64, b: f64, _| if fmin_picks_first(a, b) { 1.0 } else { 0.0 },
    |a: f64, b: f64, _| if fmin_picks_first(a, b) { 0.0 } else { 1.0 }
);
bin_op!(
    FdimOp,
    "fdim",
    "Positive difference.",
    math::fdim,
    |a: f64, b: f64, _| if a > b { 1.0 } else { 0.0 },
    |a: f64, b: f64, _| if a > b { -1.0 } else { 0.0 }
);
bin_op!(
    FmodOp,
    "fmod",
    "Floating-point remainder with the sign of the dividend.",
    |a: f64, b: f64| a % b,
    |_, _, _| 1.0,
    |a: f64, b: f64, _| -(a / b).trunc()
);
bin_op!(
    LogSumExpOp,
    "log_sum_exp",
    "`ln(exp(a) + exp(b))`.",
    math::log_sum_exp,
    |a: f64, _, fx: f64| (a - fx).exp(),
    |_, b: f64, fx: f64| (b - fx).exp()
);

fn fmax_picks_first(a: f64, b: f64) -> bool {
    !a.is_nan() && (b.is_nan() || a >= b)
}

fn fmin_picks_first(a: f64, b: f64) -> bool {
    !a.is_nan() && (b.is_nan() || a <= b)
}
