//! Plain `f64` versions of the numerically delicate scalar functions.
//!
//! The differentiable operators in [`ops`](crate::ops) evaluate through these,
//! and they are usable on their own by code that never touches a stack.

/// `ln(1 + exp(a))` without overflow for large `a`.
pub fn log1p_exp(a: f64) -> f64 {
    if a > 0.0 {
        a + (-a).exp().ln_1p()
    } else {
        a.exp().ln_1p()
    }
}

/// `ln(exp(a) + exp(b))`, shifted by the larger argument so that neither
/// exponential overflows.
pub fn log_sum_exp(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if a == f64::INFINITY && b == f64::INFINITY {
        return f64::INFINITY;
    }
    if a > b {
        a + log1p_exp(b - a)
    } else {
        b + log1p_exp(a - b)
    }
}

/// `ln(Σ exp(x_i))` over a slice; `-inf` for an empty slice.
pub fn log_sum_exp_slice(xs: &[f64]) -> f64 {
    log_sum_exp_iter(xs.iter().copied())
}

/// [`log_sum_exp_slice`] over any re-iterable sequence; walks it twice.
pub fn log_sum_exp_iter<I>(xs: I) -> f64
where
    I: Iterator<Item = f64> + Clone,
{
    let max = xs.clone().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY || max == f64::INFINITY {
        return max;
    }
    let sum: f64 = xs
        .filter(|&x| x != f64::NEG_INFINITY)
        .map(|x| (x - max).exp())
        .sum();
    max + sum.ln()
}

/// Logistic sigmoid `1 / (1 + exp(-a))`.
pub fn inv_logit(a: f64) -> f64 {
    if a < 0.0 {
        let e = a.exp();
        e / (1.0 + e)
    } else {
        1.0 / (1.0 + (-a).exp())
    }
}

/// Log odds `ln(u / (1 - u))`.
pub fn logit(u: f64) -> f64 {
    (u / (1.0 - u)).ln()
}

/// Inverse complementary log-log link, `1 - exp(-exp(a))`.
pub fn inv_cloglog(a: f64) -> f64 {
    1.0 - (-a.exp()).exp()
}

/// `ln(1 - a)`.
pub fn log1m(a: f64) -> f64 {
    (-a).ln_1p()
}

/// `ln(inv_logit(a))`.
pub fn log_inv_logit(a: f64) -> f64 {
    -log1p_exp(-a)
}

/// Positive difference `max(a - b, 0)`.
pub fn fdim(a: f64, b: f64) -> f64 {
    if a > b {
        a - b
    } else {
        0.0
    }
}

/// Larger argument; a NaN loses to the other operand.
pub fn fmax(a: f64, b: f64) -> f64 {
    if a.is_nan() {
        b
    } else if b.is_nan() || a >= b {
        a
    } else {
        b
    }
}

/// Smaller argument; a NaN loses to the other operand.
pub fn fmin(a: f64, b: f64) -> f64 {
    if a.is_nan() {
        b
    } else if b.is_nan() || a <= b {
        a
    } else {
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn log_sum_exp_does_not_overflow() {
        assert_relative_eq!(log_sum_exp(1000.0, 10.0), 1000.0);
        assert_relative_eq!(log_sum_exp(10.0, 1000.0), 1000.0);
        assert_relative_eq!(
            log_sum_exp(5.0, 2.0),
            (5.0_f64.exp() + 2.0_f64.exp()).ln(),
            max_relative = 1e-14
        );
    }

    #[test]
    fn log_sum_exp_infinities() {
        assert_eq!(log_sum_exp(f64::NEG_INFINITY, 3.0), 3.0);
        assert_eq!(log_sum_exp(3.0, f64::NEG_INFINITY), 3.0);
        assert_eq!(log_sum_exp(f64::INFINITY, f64::INFINITY), f64::INFINITY);
        assert_eq!(
            log_sum_exp(f64::NEG_INFINITY, f64::NEG_INFINITY),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn log_sum_exp_slice_matches_pairwise() {
        let xs = [1.0, -2.0, 3.5, f64::NEG_INFINITY];
        let pairwise = xs.iter().copied().fold(f64::NEG_INFINITY, log_sum_exp);
        assert_relative_eq!(log_sum_exp_slice(&xs), pairwise, max_relative = 1e-14);
        assert_eq!(log_sum_exp_slice(&[]), f64::NEG_INFINITY);
    }

    #[test]
    fn log_sum_exp_iter_walks_borrowed_values() {
        let pairs = [(1.0, 'a'), (800.0, 'b'), (799.0, 'c')];
        let lse = log_sum_exp_iter(pairs.iter().map(|p| p.0));
        assert_relative_eq!(lse, 800.0 + (1.0 + (-1.0_f64).exp()).ln(), max_relative = 1e-15);
        assert_eq!(log_sum_exp_iter([f64::INFINITY, 1.0].into_iter()), f64::INFINITY);
        assert_eq!(log_sum_exp_iter(std::iter::empty()), f64::NEG_INFINITY);
    }

    #[test]
    fn logistic_pair_round_trips() {
        for &u in &[0.01, 0.3, 0.5, 0.9] {
            assert_relative_eq!(inv_logit(logit(u)), u, max_relative = 1e-12);
        }
        assert_eq!(inv_logit(-800.0), 0.0);
        assert_eq!(inv_logit(800.0), 1.0);
    }

    #[test]
    fn log1p_exp_large_argument() {
        assert_relative_eq!(log1p_exp(800.0), 800.0);
        assert_relative_eq!(log1p_exp(0.0), 2.0_f64.ln());
        assert_relative_eq!(log_inv_logit(0.0), 0.5_f64.ln());
    }

    #[test]
    fn fmax_fmin_nan_handling() {
        assert_eq!(fmax(f64::NAN, 2.0), 2.0);
        assert_eq!(fmax(2.0, f64::NAN), 2.0);
        assert_eq!(fmin(f64::NAN, -1.0), -1.0);
        assert_eq!(fmax(1.0, 3.0), 3.0);
        assert_eq!(fmin(1.0, 3.0), 1.0);
        assert_eq!(fdim(5.0, 2.0), 3.0);
        assert_eq!(fdim(2.0, 5.0), 0.0);
    }

    #[test]
    fn inv_cloglog_values() {
        assert_relative_eq!(inv_cloglog(0.0), 1.0 - (-1.0_f64).exp());
        assert_relative_eq!(log1m(0.25), 0.75_f64.ln());
    }
}
