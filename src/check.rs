//! Argument validation for functions built on the stack.
//!
//! Each helper inspects only the value of its argument, so it works the same
//! for constants and recorded values and records nothing. A failed check
//! returns [`AdError::Domain`]; nodes recorded before the failure stay on the
//! stack until the caller recovers it.

use crate::errors::{AdError, Result};
use crate::scalar::ValueOf;

#[inline]
fn require<T: ValueOf + ?Sized>(
    ok: impl FnOnce(f64) -> bool,
    function: &'static str,
    argument: &'static str,
    x: &T,
    requirement: &'static str,
) -> Result<()> {
    let value = x.value_of();
    if ok(value) {
        Ok(())
    } else {
        Err(AdError::Domain {
            function,
            argument,
            value,
            requirement,
        })
    }
}

/// Neither NaN nor infinite.
pub fn check_finite<T: ValueOf + ?Sized>(function: &'static str, argument: &'static str, x: &T) -> Result<()> {
    require(f64::is_finite, function, argument, x, "finite")
}

/// Not NaN.
pub fn check_not_nan<T: ValueOf + ?Sized>(function: &'static str, argument: &'static str, x: &T) -> Result<()> {
    require(|v| !v.is_nan(), function, argument, x, "not nan")
}

/// Strictly greater than zero; `+inf` passes.
pub fn check_positive<T: ValueOf + ?Sized>(function: &'static str, argument: &'static str, x: &T) -> Result<()> {
    require(|v| v > 0.0, function, argument, x, "positive")
}

/// Strictly greater than zero and finite.
pub fn check_positive_finite<T: ValueOf + ?Sized>(
    function: &'static str,
    argument: &'static str,
    x: &T,
) -> Result<()> {
    require(|v| v > 0.0 && v.is_finite(), function, argument, x, "positive finite")
}

/// Zero or greater.
pub fn check_nonnegative<T: ValueOf + ?Sized>(function: &'static str, argument: &'static str, x: &T) -> Result<()> {
    require(|v| v >= 0.0, function, argument, x, "nonnegative")
}

/// Inside the closed interval `[low, high]`.
pub fn check_bounded<T: ValueOf + ?Sized>(
    function: &'static str,
    argument: &'static str,
    x: &T,
    low: f64,
    high: f64,
) -> Result<()> {
    require(|v| low <= v && v <= high, function, argument, x, "within bounds")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::Scalar;
    use crate::stack::Stack;

    #[test]
    fn passing_checks() {
        let stack = Stack::new();
        let sigma = stack.var(2.0);
        assert!(check_positive("normal_log", "sigma", &sigma).is_ok());
        assert!(check_positive_finite("normal_log", "sigma", &sigma).is_ok());
        assert!(check_finite("normal_log", "mu", &0.0).is_ok());
        assert!(check_nonnegative("poisson_log", "n", &0.0).is_ok());
        assert!(check_bounded("bernoulli_log", "theta", &Scalar::from(0.3), 0.0, 1.0).is_ok());
        assert!(check_not_nan("f", "x", &f64::INFINITY).is_ok());
        assert!(check_positive("f", "x", &f64::INFINITY).is_ok());
    }

    #[test]
    fn failing_check_reports_value_and_requirement() {
        let stack = Stack::new();
        let sigma = stack.var(-1.0);
        let err = check_positive("normal_log", "sigma", &sigma).unwrap_err();
        assert_eq!(
            err,
            AdError::Domain {
                function: "normal_log",
                argument: "sigma",
                value: -1.0,
                requirement: "positive",
            }
        );
        assert_eq!(err.to_string(), "normal_log: sigma is -1, but must be positive");
    }

    #[test]
    fn nan_and_infinity_rejections() {
        assert!(check_finite("f", "x", &f64::NAN).is_err());
        assert!(check_finite("f", "x", &f64::NEG_INFINITY).is_err());
        assert!(check_not_nan("f", "x", &f64::NAN).is_err());
        assert!(check_positive("f", "x", &f64::NAN).is_err());
        assert!(check_positive_finite("f", "x", &f64::INFINITY).is_err());
        assert!(check_nonnegative("f", "x", &-0.5).is_err());
        assert!(check_bounded("f", "x", &1.5, 0.0, 1.0).is_err());
    }
}
