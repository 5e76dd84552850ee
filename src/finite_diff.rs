//! Centered finite differences, for checking recorded gradients.
//!
//! The functions here take the function under test as a closure over
//! recorded parameters, so the same code produces both the reverse-mode
//! gradient and its numerical estimate.

use crate::errors::Result;
use crate::scalar::Scalar;
use crate::stack::Stack;
use crate::var::Var;

/// Centered-difference gradient of `f` at `point`.
///
/// The step for coordinate `i` is `eps * max(1, |point[i]|)`.
///
/// ```
/// use rev_ad::finite_diff::finite_diff_grad;
///
/// let g = finite_diff_grad(|v: &[f64]| v[0] * v[0] + v[1].sin(), &[3.0, 0.0], 1e-6);
/// assert!((g[0] - 6.0).abs() < 1e-6);
/// assert!((g[1] - 1.0).abs() < 1e-6);
/// ```
pub fn finite_diff_grad<F>(mut f: F, point: &[f64], eps: f64) -> Vec<f64>
where
    F: FnMut(&[f64]) -> f64,
{
    let mut x = point.to_vec();
    (0..point.len())
        .map(|i| {
            let h = eps * point[i].abs().max(1.0);
            x[i] = point[i] + h;
            let up = f(&x);
            x[i] = point[i] - h;
            let down = f(&x);
            x[i] = point[i];
            (up - down) / (2.0 * h)
        })
        .collect()
}

/// Largest absolute element-wise difference.
///
/// # Panics
/// If the lengths differ.
pub fn max_grad_error(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "gradient lengths differ");
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
}

/// Evaluates `f` on a fresh stack and returns its value and reverse-mode
/// gradient at `point`.
pub fn value_and_grad<F>(f: F, point: &[f64]) -> Result<(f64, Vec<f64>)>
where
    F: for<'s> Fn(&[Var<'s>]) -> Scalar<'s>,
{
    let stack = Stack::new();
    let params = stack.vars(point);
    let out = f(&params[..]);
    Ok((out.val(), out.gradient(&params)?))
}

/// Largest difference between the reverse-mode gradient of `f` and its
/// centered-difference estimate at `point`.
pub fn gradient_error<F>(f: F, point: &[f64], eps: f64) -> Result<f64>
where
    F: for<'s> Fn(&[Var<'s>]) -> Scalar<'s>,
{
    let (_, grad) = value_and_grad(&f, point)?;
    let mut scratch = Stack::new();
    let numeric = finite_diff_grad(|x| scratch_value(&mut scratch, &f, x), point, eps);
    Ok(max_grad_error(&grad, &numeric))
}

fn scratch_value<F>(stack: &mut Stack, f: &F, x: &[f64]) -> f64
where
    F: for<'s> Fn(&[Var<'s>]) -> Scalar<'s>,
{
    stack.scoped(|s| f(s.vars(x).as_slice()).val())
}
