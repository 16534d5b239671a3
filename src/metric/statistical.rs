//! Statistical comparison functions between observed and predicted series.
//!
//! The registry mirrors the regression metrics of common statistics libraries.
//! Every function reads `y_true` and `y_pred` from its keywords; some accept
//! `sample_weight` and `squared`. None of them accepts the feature vector, so
//! for statistical metrics the arm parameters only matter through whatever a
//! wrapper injects.

use serde_json::Value;

use super::Kwargs;
use crate::error::{Error, Result};

const Y_TRUE: &str = "y_true";
const Y_PRED: &str = "y_pred";
const SAMPLE_WEIGHT: &str = "sample_weight";
const SQUARED: &str = "squared";

/// The statistical-function registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatisticalFn {
    /// Mean of squared errors; `squared = false` returns its square root.
    MeanSquaredError,
    /// Square root of the mean squared error.
    RootMeanSquaredError,
    /// Mean of absolute errors.
    MeanAbsoluteError,
    /// Median of absolute errors.
    MedianAbsoluteError,
    /// Largest absolute error.
    MaxError,
    /// Coefficient of determination.
    R2Score,
    /// Explained variance.
    ExplainedVarianceScore,
    /// Mean of absolute errors relative to `|y_true|`.
    MeanAbsolutePercentageError,
}

impl StatisticalFn {
    /// Every registered function.
    pub const ALL: [StatisticalFn; 8] = [
        StatisticalFn::MeanSquaredError,
        StatisticalFn::RootMeanSquaredError,
        StatisticalFn::MeanAbsoluteError,
        StatisticalFn::MedianAbsoluteError,
        StatisticalFn::MaxError,
        StatisticalFn::R2Score,
        StatisticalFn::ExplainedVarianceScore,
        StatisticalFn::MeanAbsolutePercentageError,
    ];

    /// Looks a function up by its registry name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BackendNotFound`] if the name is not registered.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| Error::BackendNotFound {
                kind: "statistical",
                name: name.to_string(),
            })
    }

    /// The registry name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            StatisticalFn::MeanSquaredError => "mean_squared_error",
            StatisticalFn::RootMeanSquaredError => "root_mean_squared_error",
            StatisticalFn::MeanAbsoluteError => "mean_absolute_error",
            StatisticalFn::MedianAbsoluteError => "median_absolute_error",
            StatisticalFn::MaxError => "max_error",
            StatisticalFn::R2Score => "r2_score",
            StatisticalFn::ExplainedVarianceScore => "explained_variance_score",
            StatisticalFn::MeanAbsolutePercentageError => "mean_absolute_percentage_error",
        }
    }

    /// The keywords the function accepts.
    #[must_use]
    pub fn params(self) -> &'static [&'static str] {
        match self {
            StatisticalFn::MeanSquaredError => &[Y_TRUE, Y_PRED, SAMPLE_WEIGHT, SQUARED],
            StatisticalFn::MedianAbsoluteError | StatisticalFn::MaxError => &[Y_TRUE, Y_PRED],
            _ => &[Y_TRUE, Y_PRED, SAMPLE_WEIGHT],
        }
    }

    /// Computes the function from its keywords.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `y_true`/`y_pred` are missing, not
    /// numeric arrays, empty, or of different lengths, or if `sample_weight`
    /// does not match them.
    pub fn compute(self, kwargs: &Kwargs) -> Result<f64> {
        let y_true = vector(kwargs, Y_TRUE)?;
        let y_pred = vector(kwargs, Y_PRED)?;
        if y_true.is_empty() {
            return Err(Error::invalid_argument(Y_TRUE, "must not be empty"));
        }
        if y_true.len() != y_pred.len() {
            return Err(Error::invalid_argument(
                Y_PRED,
                format!("length {} does not match y_true length {}", y_pred.len(), y_true.len()),
            ));
        }
        let weights = match kwargs.get(SAMPLE_WEIGHT) {
            Some(Value::Null) | None => vec![1.0; y_true.len()],
            Some(_) => {
                let w = vector(kwargs, SAMPLE_WEIGHT)?;
                if w.len() != y_true.len() {
                    return Err(Error::invalid_argument(
                        SAMPLE_WEIGHT,
                        "length does not match y_true",
                    ));
                }
                w
            }
        };
        let squared = match kwargs.get(SQUARED) {
            None | Some(Value::Null) => true,
            Some(v) => v
                .as_bool()
                .ok_or_else(|| Error::invalid_argument(SQUARED, "must be a boolean"))?,
        };

        let errors: Vec<f64> = y_true.iter().zip(&y_pred).map(|(t, p)| t - p).collect();
        let value = match self {
            StatisticalFn::MeanSquaredError => {
                let mse = weighted_mean(errors.iter().map(|e| e * e), &weights);
                if squared { mse } else { mse.sqrt() }
            }
            StatisticalFn::RootMeanSquaredError => {
                weighted_mean(errors.iter().map(|e| e * e), &weights).sqrt()
            }
            StatisticalFn::MeanAbsoluteError => {
                weighted_mean(errors.iter().map(|e| e.abs()), &weights)
            }
            StatisticalFn::MedianAbsoluteError => {
                median(errors.iter().map(|e| e.abs()).collect())
            }
            StatisticalFn::MaxError => errors.iter().map(|e| e.abs()).fold(0.0, f64::max),
            StatisticalFn::R2Score => {
                let mean_true = weighted_mean(y_true.iter().copied(), &weights);
                let ss_res: f64 = errors.iter().zip(&weights).map(|(e, w)| w * e * e).sum();
                let ss_tot: f64 = y_true
                    .iter()
                    .zip(&weights)
                    .map(|(t, w)| w * (t - mean_true).powi(2))
                    .sum();
                score_from_ratio(ss_res, ss_tot)
            }
            StatisticalFn::ExplainedVarianceScore => {
                let mean_err = weighted_mean(errors.iter().copied(), &weights);
                let mean_true = weighted_mean(y_true.iter().copied(), &weights);
                let var_err = weighted_mean(errors.iter().map(|e| (e - mean_err).powi(2)), &weights);
                let var_true =
                    weighted_mean(y_true.iter().map(|t| (t - mean_true).powi(2)), &weights);
                score_from_ratio(var_err, var_true)
            }
            StatisticalFn::MeanAbsolutePercentageError => weighted_mean(
                errors
                    .iter()
                    .zip(&y_true)
                    .map(|(e, t)| e.abs() / t.abs().max(f64::EPSILON)),
                &weights,
            ),
        };
        Ok(value)
    }
}

/// `1 - num / den`, with a constant `y_true` scoring 1.0 for a perfect fit and
/// 0.0 otherwise.
fn score_from_ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        if num == 0.0 { 1.0 } else { 0.0 }
    } else {
        1.0 - num / den
    }
}

fn weighted_mean(values: impl Iterator<Item = f64>, weights: &[f64]) -> f64 {
    let (sum, total) = values
        .zip(weights)
        .fold((0.0, 0.0), |(s, t), (v, w)| (s + v * w, t + w));
    sum / total
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn vector(kwargs: &Kwargs, name: &str) -> Result<Vec<f64>> {
    let value = kwargs
        .get(name)
        .ok_or_else(|| Error::invalid_argument(name, "missing"))?;
    serde_json::from_value(value.clone())
        .map_err(|e| Error::invalid_argument(name, format!("expected a numeric array: {e}")))
}
