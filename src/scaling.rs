//! Converting simulator output into the units of the observations.

use chrono::NaiveDateTime;

/// Water density, kg m⁻³.
const WATER_DENSITY: f64 = 1000.0;

/// Latent heat of vaporization, J kg⁻¹.
const LATENT_HEAT: f64 = 2_440_000.0;

/// Scales per-layer transpiration to a plot-level energy flux.
///
/// `trans[t][z]` is the simulated transpiration at time `t` and layer `z`, in
/// m³ H₂O m⁻¹ stem s⁻¹. Each layer is multiplied by the layer thickness
/// `dz`, converted to W m⁻² of crown area, scaled up from one crown to all
/// crowns of the species and divided by the plot area. The result is summed
/// over layers per time step. NaN layers are skipped, so a time step with no
/// finite layer sums to `0.0`.
///
/// ```
/// use trialwrap::scaling::scale_transpiration;
///
/// let flux = scale_transpiration(&[vec![1e-9, f64::NAN]], 0.5, 2.0, 4.0, 8.0);
/// assert!((flux[0] - 1e-9 * 1000.0 * 0.5 * 2_440_000.0 / 2.0 * 4.0 / 8.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn scale_transpiration(
    trans: &[Vec<f64>],
    dz: f64,
    mean_crown_area_sp: f64,
    total_crown_area_sp: f64,
    plot_area: f64,
) -> Vec<f64> {
    let factor = WATER_DENSITY * dz * LATENT_HEAT / mean_crown_area_sp * total_crown_area_sp / plot_area;
    trans
        .iter()
        .map(|layers| {
            layers
                .iter()
                .filter(|v| !v.is_nan())
                .map(|v| v * factor)
                .sum()
        })
        .collect()
}

/// Returns the part of a time-sorted series between `start` and `end`,
/// both inclusive.
///
/// Used to cut observations down to the simulated period.
#[must_use]
pub fn slice_observations<T>(
    series: &[(NaiveDateTime, T)],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> &[(NaiveDateTime, T)] {
    let lo = series.partition_point(|(t, _)| *t < start);
    let hi = series.partition_point(|(t, _)| *t <= end);
    if lo >= hi { &[] } else { &series[lo..hi] }
}
