//! Synthetic benchmark functions and the catalogs they are resolved from.
//!
//! Three catalogs are searched in a fixed order when a metric asks for a
//! synthetic function by name:
//!
//! | Order | Source | Contents |
//! |-------|--------|----------|
//! | 1 | [`SyntheticSource::Local`] | Functions defined for this crate's own models (`FakePalm`, `fake_palm`) |
//! | 2 | [`SyntheticSource::Platform`] | The optimization platform's catalog (`Hartmann6`, `Branin`, their augmented variants and ready instances) |
//! | 3 | [`SyntheticSource::ThirdParty`] | A benchmark-problem catalog (`Ackley`, `Beale`, `Branin`, `Rosenbrock`, ...) |
//!
//! The first match wins, so local definitions shadow platform defaults, which
//! shadow third-party defaults. `Branin` therefore resolves to the platform
//! class even though the third-party catalog also has one.
//!
//! Entries are tagged by how they become callable:
//!
//! - [`CatalogEntry::Instance`]: already a [`SyntheticFunction`].
//! - [`CatalogEntry::Class`]: a platform class, instantiated with no arguments.
//! - [`CatalogEntry::Benchmark`]: a [`TestProblem`] class, instantiated and then
//!   adapted through [`FromBenchmark`], which wraps its `evaluate_true`.
//!
//! # Examples
//!
//! ```
//! use trialwrap::synthetic::{SyntheticCatalog, SyntheticSource};
//!
//! let catalog = SyntheticCatalog::standard();
//! let resolved = catalog.resolve("Ackley").unwrap();
//! assert_eq!(resolved.source, SyntheticSource::ThirdParty);
//! assert!(resolved.function.evaluate(&[0.0, 0.0]).unwrap().abs() < 1e-8);
//! ```

mod functions;
mod local;
mod platform;
mod third_party;

use std::collections::BTreeMap;
use std::sync::Arc;

pub use functions::map_range;
pub use local::FakePalm;
pub use platform::{AugBranin, AugHartmann6, Branin, Hartmann6};

use crate::error::{Error, Result};

/// A closed-form benchmark function in the platform's calling convention.
///
/// Implementations must check the input dimensionality and return
/// [`Error::DimensionMismatch`] instead of panicking.
pub trait SyntheticFunction: Send + Sync {
    /// The human-readable function name, used as the default metric name.
    fn name(&self) -> &str;

    /// The number of inputs the function requires, if fixed.
    fn required_dimensionality(&self) -> Option<usize>;

    /// Per-dimension `(low, high)` bounds of the usual search domain.
    fn domain(&self) -> Vec<(f64, f64)>;

    /// The known global minimum, if any.
    fn fmin(&self) -> Option<f64> {
        None
    }

    /// Evaluates the function at `x`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `x` has the wrong length.
    fn evaluate(&self, x: &[f64]) -> Result<f64>;
}

/// A benchmark problem in the third-party catalog's convention.
///
/// These are not directly usable as metrics; wrap them in [`FromBenchmark`].
pub trait TestProblem: Send + Sync {
    /// The problem name.
    fn name(&self) -> &str;

    /// The input dimensionality.
    fn dim(&self) -> usize;

    /// Per-dimension `(low, high)` bounds.
    fn bounds(&self) -> Vec<(f64, f64)>;

    /// The known optimal value, if any.
    fn optimal_value(&self) -> Option<f64> {
        None
    }

    /// Evaluates the noiseless objective. `x.len() == self.dim()` is guaranteed
    /// by the adapter.
    fn evaluate_true(&self, x: &[f64]) -> f64;
}

/// Adapts a [`TestProblem`] into a [`SyntheticFunction`].
pub struct FromBenchmark {
    problem: Box<dyn TestProblem>,
}

impl FromBenchmark {
    /// Wraps an instantiated benchmark problem.
    #[must_use]
    pub fn new(problem: Box<dyn TestProblem>) -> Self {
        Self { problem }
    }
}

impl SyntheticFunction for FromBenchmark {
    fn name(&self) -> &str {
        self.problem.name()
    }

    fn required_dimensionality(&self) -> Option<usize> {
        Some(self.problem.dim())
    }

    fn domain(&self) -> Vec<(f64, f64)> {
        self.problem.bounds()
    }

    fn fmin(&self) -> Option<f64> {
        self.problem.optimal_value()
    }

    fn evaluate(&self, x: &[f64]) -> Result<f64> {
        let expected = self.problem.dim();
        if x.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                got: x.len(),
            });
        }
        Ok(self.problem.evaluate_true(x))
    }
}

/// Which catalog a synthetic function was resolved from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SyntheticSource {
    /// Functions defined by this crate for its own models.
    Local,
    /// The optimization platform's built-in catalog.
    Platform,
    /// The third-party benchmark-problem catalog.
    ThirdParty,
}

impl SyntheticSource {
    /// Catalog search order.
    pub const SEARCH_ORDER: [SyntheticSource; 3] = [
        SyntheticSource::Local,
        SyntheticSource::Platform,
        SyntheticSource::ThirdParty,
    ];
}

/// A catalog entry, tagged by how it becomes a callable function.
#[derive(Clone)]
pub enum CatalogEntry {
    /// A ready-to-use function instance.
    Instance(Arc<dyn SyntheticFunction>),
    /// A platform class; instantiated with no arguments on resolution.
    Class(fn() -> Arc<dyn SyntheticFunction>),
    /// A benchmark-problem class; instantiated and adapted with [`FromBenchmark`].
    Benchmark(fn() -> Box<dyn TestProblem>),
}

impl CatalogEntry {
    fn instantiate(&self) -> Arc<dyn SyntheticFunction> {
        match self {
            CatalogEntry::Instance(f) => Arc::clone(f),
            CatalogEntry::Class(ctor) => ctor(),
            CatalogEntry::Benchmark(ctor) => Arc::new(FromBenchmark::new(ctor())),
        }
    }
}

/// The result of resolving a synthetic function by name.
#[derive(Clone)]
pub struct ResolvedSynthetic {
    /// The catalog the name was found in.
    pub source: SyntheticSource,
    /// The callable function.
    pub function: Arc<dyn SyntheticFunction>,
}

/// The ordered set of synthetic-function catalogs.
#[derive(Clone, Default)]
pub struct SyntheticCatalog {
    sources: BTreeMap<SyntheticSource, BTreeMap<String, CatalogEntry>>,
}

impl SyntheticCatalog {
    /// Creates a catalog with no entries.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates the catalog with the local, platform and third-party functions.
    #[must_use]
    pub fn standard() -> Self {
        let mut catalog = Self::empty();
        for (name, entry) in local::entries() {
            catalog.register(SyntheticSource::Local, name, entry);
        }
        for (name, entry) in platform::entries() {
            catalog.register(SyntheticSource::Platform, name, entry);
        }
        for (name, entry) in third_party::entries() {
            catalog.register(SyntheticSource::ThirdParty, name, entry);
        }
        catalog
    }

    /// Registers `entry` under `name` in the given source, replacing any
    /// previous entry of that name in the same source.
    pub fn register(&mut self, source: SyntheticSource, name: impl Into<String>, entry: CatalogEntry) {
        self.sources
            .entry(source)
            .or_default()
            .insert(name.into(), entry);
    }

    /// Returns `true` if `name` exists in any source.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sources.values().any(|s| s.contains_key(name))
    }

    /// Lists the names registered in one source.
    pub fn names(&self, source: SyntheticSource) -> impl Iterator<Item = &str> {
        self.sources
            .get(&source)
            .into_iter()
            .flat_map(|s| s.keys().map(String::as_str))
    }

    /// Resolves `name` by searching the sources in [`SyntheticSource::SEARCH_ORDER`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendNotFound`] if no source has the name.
    pub fn resolve(&self, name: &str) -> Result<ResolvedSynthetic> {
        for source in SyntheticSource::SEARCH_ORDER {
            if let Some(entry) = self.sources.get(&source).and_then(|s| s.get(name)) {
                trace_debug!(name, ?source, "synthetic function resolved");
                return Ok(ResolvedSynthetic {
                    source,
                    function: entry.instantiate(),
                });
            }
        }
        Err(Error::BackendNotFound {
            kind: "synthetic",
            name: name.to_string(),
        })
    }
}

/// Returns `Err(DimensionMismatch)` unless `x.len() == expected`.
pub(crate) fn check_dim(x: &[f64], expected: usize) -> Result<()> {
    if x.len() == expected {
        Ok(())
    } else {
        Err(Error::DimensionMismatch {
            expected,
            got: x.len(),
        })
    }
}
