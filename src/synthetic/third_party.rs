//! Benchmark problems in the third-party catalog convention.

use super::functions::{
    self, BRANIN_FMIN, HARTMANN6_FMIN, SIX_HUMP_CAMEL_FMIN, STYBLINSKI_TANG_FMIN_PER_DIM,
};
use super::{CatalogEntry, TestProblem};

/// A benchmark problem described by a formula, a dimension and bounds.
pub(crate) struct Problem {
    name: &'static str,
    dim: usize,
    bounds: fn(usize) -> Vec<(f64, f64)>,
    optimal_value: fn(usize) -> Option<f64>,
    f: fn(&[f64]) -> f64,
}

impl Problem {
    /// Creates the problem with a different dimensionality.
    ///
    /// Only meaningful for the variable-dimension problems.
    pub(crate) fn with_dim(mut self, dim: usize) -> Self {
        self.dim = dim;
        self
    }
}

impl TestProblem for Problem {
    fn name(&self) -> &str {
        self.name
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn bounds(&self) -> Vec<(f64, f64)> {
        (self.bounds)(self.dim)
    }

    fn optimal_value(&self) -> Option<f64> {
        (self.optimal_value)(self.dim)
    }

    fn evaluate_true(&self, x: &[f64]) -> f64 {
        (self.f)(x)
    }
}

fn zero(_dim: usize) -> Option<f64> {
    Some(0.0)
}

pub(crate) fn ackley() -> Problem {
    Problem {
        name: "Ackley",
        dim: 2,
        bounds: |d| vec![(-32.768, 32.768); d],
        optimal_value: zero,
        f: functions::ackley,
    }
}

fn beale() -> Problem {
    Problem {
        name: "Beale",
        dim: 2,
        bounds: |d| vec![(-4.5, 4.5); d],
        optimal_value: zero,
        f: functions::beale,
    }
}

fn branin() -> Problem {
    Problem {
        name: "Branin",
        dim: 2,
        bounds: |_| vec![(-5.0, 10.0), (0.0, 15.0)],
        optimal_value: |_| Some(BRANIN_FMIN),
        f: functions::branin,
    }
}

fn dixon_price() -> Problem {
    Problem {
        name: "DixonPrice",
        dim: 2,
        bounds: |d| vec![(-10.0, 10.0); d],
        optimal_value: zero,
        f: functions::dixon_price,
    }
}

fn griewank() -> Problem {
    Problem {
        name: "Griewank",
        dim: 2,
        bounds: |d| vec![(-600.0, 600.0); d],
        optimal_value: zero,
        f: functions::griewank,
    }
}

fn hartmann() -> Problem {
    Problem {
        name: "Hartmann",
        dim: 6,
        bounds: |d| vec![(0.0, 1.0); d],
        optimal_value: |_| Some(HARTMANN6_FMIN),
        f: functions::hartmann6,
    }
}

fn levy() -> Problem {
    Problem {
        name: "Levy",
        dim: 2,
        bounds: |d| vec![(-10.0, 10.0); d],
        optimal_value: zero,
        f: functions::levy,
    }
}

fn rastrigin() -> Problem {
    Problem {
        name: "Rastrigin",
        dim: 2,
        bounds: |d| vec![(-5.12, 5.12); d],
        optimal_value: zero,
        f: functions::rastrigin,
    }
}

fn rosenbrock() -> Problem {
    Problem {
        name: "Rosenbrock",
        dim: 2,
        bounds: |d| vec![(-5.0, 10.0); d],
        optimal_value: zero,
        f: functions::rosenbrock,
    }
}

fn six_hump_camel() -> Problem {
    Problem {
        name: "SixHumpCamel",
        dim: 2,
        bounds: |_| vec![(-3.0, 3.0), (-2.0, 2.0)],
        optimal_value: |_| Some(SIX_HUMP_CAMEL_FMIN),
        f: functions::six_hump_camel,
    }
}

#[allow(clippy::cast_precision_loss)]
fn styblinski_tang() -> Problem {
    Problem {
        name: "StyblinskiTang",
        dim: 2,
        bounds: |d| vec![(-5.0, 5.0); d],
        optimal_value: |d| Some(STYBLINSKI_TANG_FMIN_PER_DIM * d as f64),
        f: functions::styblinski_tang,
    }
}

fn three_hump_camel() -> Problem {
    Problem {
        name: "ThreeHumpCamel",
        dim: 2,
        bounds: |d| vec![(-5.0, 5.0); d],
        optimal_value: zero,
        f: functions::three_hump_camel,
    }
}

pub(super) fn entries() -> Vec<(&'static str, CatalogEntry)> {
    vec![
        ("Ackley", CatalogEntry::Benchmark(|| Box::new(ackley()))),
        ("Beale", CatalogEntry::Benchmark(|| Box::new(beale()))),
        ("Branin", CatalogEntry::Benchmark(|| Box::new(branin()))),
        ("DixonPrice", CatalogEntry::Benchmark(|| Box::new(dixon_price()))),
        ("Griewank", CatalogEntry::Benchmark(|| Box::new(griewank()))),
        ("Hartmann", CatalogEntry::Benchmark(|| Box::new(hartmann()))),
        ("Levy", CatalogEntry::Benchmark(|| Box::new(levy()))),
        ("Rastrigin", CatalogEntry::Benchmark(|| Box::new(rastrigin()))),
        ("Rosenbrock", CatalogEntry::Benchmark(|| Box::new(rosenbrock()))),
        ("SixHumpCamel", CatalogEntry::Benchmark(|| Box::new(six_hump_camel()))),
        ("StyblinskiTang", CatalogEntry::Benchmark(|| Box::new(styblinski_tang()))),
        ("ThreeHumpCamel", CatalogEntry::Benchmark(|| Box::new(three_hump_camel()))),
    ]
}
