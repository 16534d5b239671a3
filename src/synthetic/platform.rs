//! The optimization platform's built-in synthetic functions.
//!
//! Each function exists both as a class (instantiated on resolution) and as a
//! ready instance under its lower-case name.

use std::sync::Arc;

use super::functions::{
    self, BRANIN_FMIN, HARTMANN6_FMIN, branin_with_fidelity, hartmann6_with_fidelity,
};
use super::{CatalogEntry, SyntheticFunction, check_dim};
use crate::error::Result;

/// Hartmann 6D on the unit hypercube.
#[derive(Clone, Copy, Debug, Default)]
pub struct Hartmann6;

impl SyntheticFunction for Hartmann6 {
    fn name(&self) -> &str {
        "Hartmann6"
    }

    fn required_dimensionality(&self) -> Option<usize> {
        Some(6)
    }

    fn domain(&self) -> Vec<(f64, f64)> {
        vec![(0.0, 1.0); 6]
    }

    fn fmin(&self) -> Option<f64> {
        Some(HARTMANN6_FMIN)
    }

    fn evaluate(&self, x: &[f64]) -> Result<f64> {
        check_dim(x, 6)?;
        Ok(functions::hartmann6(x))
    }
}

/// Hartmann 6D with a seventh fidelity input in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AugHartmann6;

impl SyntheticFunction for AugHartmann6 {
    fn name(&self) -> &str {
        "AugHartmann6"
    }

    fn required_dimensionality(&self) -> Option<usize> {
        Some(7)
    }

    fn domain(&self) -> Vec<(f64, f64)> {
        vec![(0.0, 1.0); 7]
    }

    fn fmin(&self) -> Option<f64> {
        Some(HARTMANN6_FMIN)
    }

    fn evaluate(&self, x: &[f64]) -> Result<f64> {
        check_dim(x, 7)?;
        Ok(hartmann6_with_fidelity(&x[..6], x[6]))
    }
}

/// Branin on `[-5, 10] x [0, 15]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Branin;

impl SyntheticFunction for Branin {
    fn name(&self) -> &str {
        "Branin"
    }

    fn required_dimensionality(&self) -> Option<usize> {
        Some(2)
    }

    fn domain(&self) -> Vec<(f64, f64)> {
        vec![(-5.0, 10.0), (0.0, 15.0)]
    }

    fn fmin(&self) -> Option<f64> {
        Some(BRANIN_FMIN)
    }

    fn evaluate(&self, x: &[f64]) -> Result<f64> {
        check_dim(x, 2)?;
        Ok(functions::branin(x))
    }
}

/// Branin with a third fidelity input in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct AugBranin;

impl SyntheticFunction for AugBranin {
    fn name(&self) -> &str {
        "AugBranin"
    }

    fn required_dimensionality(&self) -> Option<usize> {
        Some(3)
    }

    fn domain(&self) -> Vec<(f64, f64)> {
        vec![(-5.0, 10.0), (0.0, 15.0), (0.0, 1.0)]
    }

    fn fmin(&self) -> Option<f64> {
        Some(BRANIN_FMIN)
    }

    fn evaluate(&self, x: &[f64]) -> Result<f64> {
        check_dim(x, 3)?;
        Ok(branin_with_fidelity(x[0], x[1], x[2]))
    }
}

pub(super) fn entries() -> Vec<(&'static str, CatalogEntry)> {
    vec![
        ("Hartmann6", CatalogEntry::Class(|| Arc::new(Hartmann6))),
        ("AugHartmann6", CatalogEntry::Class(|| Arc::new(AugHartmann6))),
        ("Branin", CatalogEntry::Class(|| Arc::new(Branin))),
        ("AugBranin", CatalogEntry::Class(|| Arc::new(AugBranin))),
        ("hartmann6", CatalogEntry::Instance(Arc::new(Hartmann6))),
        ("aug_hartmann6", CatalogEntry::Instance(Arc::new(AugHartmann6))),
        ("branin", CatalogEntry::Instance(Arc::new(Branin))),
        ("aug_branin", CatalogEntry::Instance(Arc::new(AugBranin))),
    ]
}
