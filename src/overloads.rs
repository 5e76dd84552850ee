use std::ops::*;

use crate::ops::{AddOp, DivOp, MulOp, NegOp, SubOp};
use crate::var::{apply, apply_dv, apply_vd, apply_vv, Var};

// `$left_unit` / `$right_unit`: a constant operand that leaves the other one
// unchanged. Such calls hand back the existing handle instead of recording.
macro_rules! impl_bin_ops_var {
    ($Trait:ident, $func:ident, $Op:ty, $left_unit:expr, $right_unit:expr) => {
        impl<'a> $Trait for Var<'a> {
            type Output = Var<'a>;
            #[inline]
            fn $func(self, rhs: Var<'a>) -> Var<'a> {
                apply_vv::<$Op>(self, rhs)
            }
        }
        impl<'a> $Trait<f64> for Var<'a> {
            type Output = Var<'a>;
            #[inline]
            fn $func(self, rhs: f64) -> Var<'a> {
                if $right_unit == Some(rhs) {
                    return self;
                }
                apply_vd::<$Op>(self, rhs)
            }
        }
        impl<'a> $Trait<Var<'a>> for f64 {
            type Output = Var<'a>;
            #[inline]
            fn $func(self, rhs: Var<'a>) -> Var<'a> {
                if $left_unit == Some(self) {
                    return rhs;
                }
                apply_dv::<$Op>(self, rhs)
            }
        }
    };
}

impl_bin_ops_var!(Add, add, AddOp, Some(0.0), Some(0.0));
impl_bin_ops_var!(Sub, sub, SubOp, None, Some(0.0));
impl_bin_ops_var!(Mul, mul, MulOp, Some(1.0), Some(1.0));
impl_bin_ops_var!(Div, div, DivOp, None, Some(1.0));

impl<'a> Neg for Var<'a> {
    type Output = Var<'a>;
    #[inline]
    fn neg(self) -> Var<'a> {
        apply::<NegOp>(self)
    }
}

macro_rules! impl_assign {
    ($Trait:ident, $func:ident, $sym:tt) => {
        impl<'a> $Trait<Var<'a>> for Var<'a> {
            fn $func(&mut self, rhs: Var<'a>) {
                *self = *self $sym rhs;
            }
        }
        impl $Trait<f64> for Var<'_> {
            fn $func(&mut self, rhs: f64) {
                *self = *self $sym rhs;
            }
        }
    };
}

impl_assign!(AddAssign, add_assign, +);
impl_assign!(SubAssign, sub_assign, -);
impl_assign!(MulAssign, mul_assign, *);
impl_assign!(DivAssign, div_assign, /);

#[cfg(test)]
mod tests {
    use crate::stack::Stack;
    use approx::assert_relative_eq;

    #[test]
    fn check_add_derivative() {
        let stack = Stack::new();
        let x = stack.var(2.0);
        let y = stack.var(3.0);
        let f = x + y + 1.0;
        assert_eq!(f.val(), 6.0);
        assert_eq!(f.grad(&[x, y]).unwrap(), vec![1.0, 1.0]);
    }

    #[test]
    fn check_sub_derivative() {
        let stack = Stack::new();
        let x = stack.var(2.0);
        let y = stack.var(3.0);
        let f = 10.0 - (x - y) - y;
        assert_eq!(f.val(), 8.0);
        assert_eq!(f.grad(&[x, y]).unwrap(), vec![-1.0, 0.0]);
    }

    #[test]
    fn check_mul_derivative() {
        let stack = Stack::new();
        let x = stack.var(2.0);
        let y = stack.var(3.0);
        let f = 4.0 * x * y;
        assert_eq!(f.val(), 24.0);
        assert_eq!(f.grad(&[x, y]).unwrap(), vec![12.0, 8.0]);
    }

    #[test]
    fn check_div_derivative() {
        let stack = Stack::new();
        let x = stack.var(6.0);
        let y = stack.var(3.0);
        let f = x / y;
        assert_eq!(f.val(), 2.0);
        let g = f.grad(&[x, y]).unwrap();
        assert_eq!(g[0], 1.0 / 3.0);
        assert_eq!(g[1], -2.0 / 3.0);

        stack.zero_adjoints();
        let h = 1.0 / y;
        assert_relative_eq!(h.grad(&[y]).unwrap()[0], -1.0 / 9.0, max_relative = 1e-15);
    }

    #[test]
    fn check_neg_derivative() {
        let stack = Stack::new();
        let x = stack.var(2.0);
        let f = -x;
        assert_eq!(f.val(), -2.0);
        assert_eq!(f.grad(&[x]).unwrap(), vec![-1.0]);
    }

    #[test]
    fn identity_constants_record_nothing() {
        let stack = Stack::new();
        let x = stack.var(2.0);
        let before = stack.len();
        let same = [x + 0.0, 0.0 + x, x - 0.0, x * 1.0, 1.0 * x, x / 1.0];
        assert_eq!(stack.len(), before);
        for s in same {
            assert_eq!(s.val(), 2.0);
        }
        let _ = 0.0 - x;
        let _ = 1.0 / x;
        assert_eq!(stack.len(), before + 2);
    }

    #[test]
    fn test_reassigning() {
        let stack = Stack::new();
        let a0 = stack.var(5.0);
        let b = stack.var(3.0);
        let mut a = a0;
        a *= b;
        a += 1.0;
        a -= b;
        a /= 2.0;
        assert_eq!(a.val(), (15.0 + 1.0 - 3.0) / 2.0);
        let g = a.grad(&[a0, b]).unwrap();
        assert_eq!(g, vec![1.5, 2.0]);
    }
}
