//! Synthetic functions defined for this crate's own models.

use std::sync::Arc;

use super::functions::map_range;
use super::third_party::{Problem, ackley};
use super::{CatalogEntry, FromBenchmark, TestProblem};

const ACKLEY_BOUND: f64 = 32.768;

/// Physical ranges of the four canopy parameters, in input order:
/// plot footprint, house ratio, ground ratio, mean leaf area index.
const PHYSICAL_RANGES: [(f64, f64); 4] = [(350.0, 950.0), (0.15, 0.9), (0.25, 0.8), (2.0, 6.0)];

/// A 4-D Ackley stand-in for the palm canopy model.
///
/// Inputs are given in physical units and rescaled onto the Ackley domain
/// `[-32.768, 32.768]` before evaluation, so the optimum sits at the centre of
/// each physical range.
pub struct FakePalm {
    inner: Problem,
}

impl FakePalm {
    /// Creates the 4-D problem.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: ackley().with_dim(PHYSICAL_RANGES.len()),
        }
    }
}

impl Default for FakePalm {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProblem for FakePalm {
    fn name(&self) -> &str {
        "FakePalm"
    }

    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn bounds(&self) -> Vec<(f64, f64)> {
        PHYSICAL_RANGES.to_vec()
    }

    fn optimal_value(&self) -> Option<f64> {
        self.inner.optimal_value()
    }

    fn evaluate_true(&self, x: &[f64]) -> f64 {
        let scaled: Vec<f64> = x
            .iter()
            .zip(PHYSICAL_RANGES)
            .map(|(xi, (lo, hi))| map_range(*xi, lo, hi, -ACKLEY_BOUND, ACKLEY_BOUND))
            .collect();
        self.inner.evaluate_true(&scaled)
    }
}

pub(super) fn entries() -> Vec<(&'static str, CatalogEntry)> {
    vec![
        ("FakePalm", CatalogEntry::Benchmark(|| Box::new(FakePalm::new()))),
        (
            "fake_palm",
            CatalogEntry::Instance(Arc::new(FromBenchmark::new(Box::new(FakePalm::new())))),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::SyntheticFunction;

    #[test]
    fn optimum_at_range_centres() {
        let centre: Vec<f64> = PHYSICAL_RANGES.iter().map(|(lo, hi)| (lo + hi) / 2.0).collect();
        let palm = FromBenchmark::new(Box::new(FakePalm::new()));
        assert!(palm.evaluate(&centre).unwrap().abs() < 1e-8);
        assert_eq!(palm.name(), "FakePalm");
        assert_eq!(palm.required_dimensionality(), Some(4));
    }

    #[test]
    fn range_edges_are_far_from_optimum() {
        let low: Vec<f64> = PHYSICAL_RANGES.iter().map(|(lo, _)| *lo).collect();
        assert!(FakePalm::new().evaluate_true(&low) > 15.0);
    }
}
