//! Closed-form benchmark formulas shared by all catalogs.
//!
//! Every function takes the full input vector and assumes the caller has
//! already checked its length.

use core::f64::consts::{E, PI, TAU};

pub(crate) const BRANIN_FMIN: f64 = 0.397_887_357_729_738_1;
pub(crate) const HARTMANN6_FMIN: f64 = -3.322_368_011_415_515;
pub(crate) const SIX_HUMP_CAMEL_FMIN: f64 = -1.031_628_453_489_877;
pub(crate) const STYBLINSKI_TANG_FMIN_PER_DIM: f64 = -39.166_165_703_771_41;

const HARTMANN6_ALPHA: [f64; 4] = [1.0, 1.2, 3.0, 3.2];
const HARTMANN6_A: [[f64; 6]; 4] = [
    [10.0, 3.0, 17.0, 3.5, 1.7, 8.0],
    [0.05, 10.0, 17.0, 0.1, 8.0, 14.0],
    [3.0, 3.5, 1.7, 10.0, 17.0, 8.0],
    [17.0, 8.0, 0.05, 10.0, 0.1, 14.0],
];
const HARTMANN6_P: [[f64; 6]; 4] = [
    [0.1312, 0.1696, 0.5569, 0.0124, 0.8283, 0.5886],
    [0.2329, 0.4135, 0.8307, 0.3736, 0.1004, 0.9991],
    [0.2348, 0.1451, 0.3522, 0.2883, 0.3047, 0.6650],
    [0.4047, 0.8828, 0.8732, 0.5743, 0.1091, 0.0381],
];

/// Linearly maps `value` from `[old_min, old_max]` onto `[new_min, new_max]`.
#[must_use]
pub fn map_range(value: f64, old_min: f64, old_max: f64, new_min: f64, new_max: f64) -> f64 {
    (value - old_min) * (new_max - new_min) / (old_max - old_min) + new_min
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn ackley(x: &[f64]) -> f64 {
    let (a, b, c) = (20.0, 0.2, TAU);
    let n = x.len() as f64;
    let sum_sq: f64 = x.iter().map(|xi| xi * xi).sum();
    let sum_cos: f64 = x.iter().map(|xi| (c * xi).cos()).sum();
    -a * (-b * (sum_sq / n).sqrt()).exp() - (sum_cos / n).exp() + a + E
}

pub(crate) fn beale(x: &[f64]) -> f64 {
    let (x1, x2) = (x[0], x[1]);
    (1.5 - x1 + x1 * x2).powi(2)
        + (2.25 - x1 + x1 * x2 * x2).powi(2)
        + (2.625 - x1 + x1 * x2.powi(3)).powi(2)
}

/// Branin with an optional fidelity term. `fidelity = 1.0` is the plain function.
pub(crate) fn branin_with_fidelity(x1: f64, x2: f64, fidelity: f64) -> f64 {
    let b = 5.1 / (4.0 * PI * PI) - 0.1 * (1.0 - fidelity);
    let c = 5.0 / PI;
    let r = 6.0;
    let s = 10.0;
    let t = 1.0 / (8.0 * PI);
    (x2 - b * x1 * x1 + c * x1 - r).powi(2) + s * (1.0 - t) * x1.cos() + s
}

pub(crate) fn branin(x: &[f64]) -> f64 {
    branin_with_fidelity(x[0], x[1], 1.0)
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn dixon_price(x: &[f64]) -> f64 {
    let first = (x[0] - 1.0).powi(2);
    let rest: f64 = x
        .windows(2)
        .enumerate()
        .map(|(i, w)| (i + 2) as f64 * (2.0 * w[1] * w[1] - w[0]).powi(2))
        .sum();
    first + rest
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn griewank(x: &[f64]) -> f64 {
    let sum: f64 = x.iter().map(|xi| xi * xi).sum::<f64>() / 4000.0;
    let prod: f64 = x
        .iter()
        .enumerate()
        .map(|(i, xi)| (xi / ((i + 1) as f64).sqrt()).cos())
        .product();
    sum - prod + 1.0
}

/// Hartmann 6D with an optional fidelity term on the first mixing weight.
pub(crate) fn hartmann6_with_fidelity(x: &[f64], fidelity: f64) -> f64 {
    let mut alpha = HARTMANN6_ALPHA;
    alpha[0] -= 0.1 * (1.0 - fidelity);
    let mut result = 0.0;
    for i in 0..4 {
        let inner: f64 = x
            .iter()
            .take(6)
            .enumerate()
            .map(|(j, xj)| HARTMANN6_A[i][j] * (xj - HARTMANN6_P[i][j]).powi(2))
            .sum();
        result -= alpha[i] * (-inner).exp();
    }
    result
}

pub(crate) fn hartmann6(x: &[f64]) -> f64 {
    hartmann6_with_fidelity(x, 1.0)
}

pub(crate) fn levy(x: &[f64]) -> f64 {
    let w: Vec<f64> = x.iter().map(|xi| 1.0 + (xi - 1.0) / 4.0).collect();
    let Some((last, head)) = w.split_last() else {
        return 0.0;
    };
    let first = (PI * w[0]).sin().powi(2);
    let middle: f64 = head
        .iter()
        .map(|wi| (wi - 1.0).powi(2) * (1.0 + 10.0 * (PI * wi + 1.0).sin().powi(2)))
        .sum();
    let tail = (last - 1.0).powi(2) * (1.0 + (TAU * last).sin().powi(2));
    first + middle + tail
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn rastrigin(x: &[f64]) -> f64 {
    let n = x.len() as f64;
    10.0 * n + x.iter().map(|xi| xi * xi - 10.0 * (TAU * xi).cos()).sum::<f64>()
}

pub(crate) fn rosenbrock(x: &[f64]) -> f64 {
    x.windows(2)
        .map(|w| 100.0 * (w[1] - w[0] * w[0]).powi(2) + (1.0 - w[0]).powi(2))
        .sum()
}

pub(crate) fn six_hump_camel(x: &[f64]) -> f64 {
    let (x1, x2) = (x[0], x[1]);
    (4.0 - 2.1 * x1 * x1 + x1.powi(4) / 3.0) * x1 * x1 + x1 * x2 + (4.0 * x2 * x2 - 4.0) * x2 * x2
}

pub(crate) fn styblinski_tang(x: &[f64]) -> f64 {
    0.5 * x
        .iter()
        .map(|xi| xi.powi(4) - 16.0 * xi * xi + 5.0 * xi)
        .sum::<f64>()
}

pub(crate) fn three_hump_camel(x: &[f64]) -> f64 {
    let (x1, x2) = (x[0], x[1]);
    2.0 * x1 * x1 - 1.05 * x1.powi(4) + x1.powi(6) / 6.0 + x1 * x2 + x2 * x2
}
