use std::f64::consts::PI;

use approx::assert_relative_eq;
use rev_ad::prelude::*;

/// Normal log density summed over the broadcast length of its arguments.
fn normal_log<'a>(
    y: &dyn Operand<'a>,
    mu: &dyn Operand<'a>,
    sigma: &dyn Operand<'a>,
) -> rev_ad::Result<Scalar<'a>> {
    const FUNCTION: &str = "normal_log";
    for n in 0..y.size() {
        check_not_nan(FUNCTION, "y", &y.value_at(n))?;
    }
    for n in 0..mu.size() {
        check_finite(FUNCTION, "mu", &mu.value_at(n))?;
    }
    for n in 0..sigma.size() {
        check_positive_finite(FUNCTION, "sigma", &sigma.value_at(n))?;
    }

    let len = y.size().max(mu.size()).max(sigma.size());
    let mut ops = OperandsAndPartials::new(&[y, mu, sigma]);
    let mut logp = 0.0;
    for n in 0..len {
        let s = sigma.value_at(n);
        let z = (y.value_at(n) - mu.value_at(n)) / s;
        logp += -0.5 * z * z - s.ln() - 0.5 * (2.0 * PI).ln();
        ops.d_x(0)[n] -= z / s;
        ops.d_x(1)[n] += z / s;
        ops.d_x(2)[n] += (z * z - 1.0) / s;
    }
    Ok(ops.to_var(logp))
}

/// The same density recorded operator by operator.
fn normal_log_composed<'a>(ys: &[f64], mu: Var<'a>, sigma: Var<'a>) -> Var<'a> {
    let mut lp = -(sigma.ln() * ys.len() as f64);
    for &y in ys {
        let z = (y - mu) / sigma;
        lp -= 0.5 * z.square();
    }
    lp - 0.5 * (2.0 * PI).ln() * ys.len() as f64
}

#[test]
fn accumulator_matches_composed_gradient() {
    let ys = vec![0.3_f64, -1.2, 2.2, 0.9];

    let fused = Stack::new();
    let mu = fused.var(0.4);
    let sigma = fused.var(1.7);
    let lp = normal_log(&ys, &mu, &sigma).unwrap();
    let g = lp.gradient(&[mu, sigma]).unwrap();

    let composed = Stack::new();
    let mu2 = composed.var(0.4);
    let sigma2 = composed.var(1.7);
    let lp2 = normal_log_composed(&ys, mu2, sigma2);
    let g2 = lp2.grad(&[mu2, sigma2]).unwrap();

    assert_relative_eq!(lp.val(), lp2.val(), max_relative = 1e-13);
    assert_relative_eq!(g[0], g2[0], max_relative = 1e-12);
    assert_relative_eq!(g[1], g2[1], max_relative = 1e-12);
    assert!(fused.len() < composed.len());
}

#[test]
fn vector_of_locations_gets_one_partial_each() {
    let stack = Stack::new();
    let mus = stack.vars(&[0.0, 1.0, -1.0]);
    let sigma = 2.0_f64;
    let lp = normal_log(&0.5_f64, &mus, &sigma).unwrap();
    let g = lp.gradient(&mus).unwrap();
    for (mu, d) in mus.iter().zip(&g) {
        assert_relative_eq!(*d, (0.5 - mu.val()) / 4.0, max_relative = 1e-14);
    }
}

#[test]
fn scalar_scale_accumulates_across_elements() {
    let stack = Stack::new();
    let ys = [1.0_f64, 2.0, 3.0];
    let sigma = stack.var(1.5);
    let lp = normal_log(&ys, &Scalar::Constant(2.0), &sigma).unwrap();
    let expected: f64 = ys
        .iter()
        .map(|y| {
            let z = (y - 2.0) / 1.5;
            (z * z - 1.0) / 1.5
        })
        .sum();
    assert_relative_eq!(lp.gradient(&[sigma]).unwrap()[0], expected, max_relative = 1e-14);
}

#[test]
fn recorded_gradient_matches_finite_differences() {
    fn density<'s>(v: &[Var<'s>]) -> Scalar<'s> {
        let ys = [0.1_f64, 0.7, -0.4];
        match normal_log(&ys, &v[0], &v[1]) {
            Ok(lp) => lp,
            Err(_) => Scalar::Constant(f64::NEG_INFINITY),
        }
    }
    let err = rev_ad::finite_diff::gradient_error(density, &[0.2, 0.8], 1e-6).unwrap();
    assert!(err < 1e-6);
}

#[test]
fn constant_only_call_records_nothing() {
    let stack = Stack::new();
    let _unrelated = stack.var(1.0);
    let before = stack.len();
    let lp = normal_log(&[0.1_f64, 0.2], &0.0_f64, &1.0_f64).unwrap();
    assert!(lp.is_constant());
    assert_eq!(stack.len(), before);
    let manual = -0.5 * (0.01 + 0.04) - (2.0 * PI).ln();
    assert_relative_eq!(lp.val(), manual, max_relative = 1e-14);
}

#[test]
fn domain_error_midway_then_recover() {
    let mut stack = Stack::new();
    let err = {
        let mu = stack.var(0.0);
        let log_sigma = stack.var(-1.0);
        let shifted = mu + 0.5;
        let sigma = log_sigma - 1.0;
        let recorded = stack.len();
        let err = normal_log(&1.0_f64, &shifted, &sigma).unwrap_err();
        assert_eq!(stack.len(), recorded);
        err
    };
    assert_eq!(
        err,
        AdError::Domain {
            function: "normal_log",
            argument: "sigma",
            value: -2.0,
            requirement: "positive finite",
        }
    );
    assert_eq!(stack.len(), 4);
    stack.recover();
    assert!(stack.is_empty());
}

#[test]
fn scoped_evaluation_cleans_up_after_errors() {
    let mut stack = Stack::new();
    for sigma in [1.0_f64, -1.0, 2.0] {
        let outcome = stack.scoped(|s| {
            let mu = s.var(0.3);
            let lp = normal_log(&[1.0_f64, 2.0], &mu, &sigma)?;
            lp.gradient(&[mu])
        });
        assert_eq!(outcome.is_ok(), sigma > 0.0);
        assert!(stack.is_empty());
    }
}
