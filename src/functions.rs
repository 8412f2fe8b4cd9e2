//! Numeric building blocks shared by metrics and summary statistics.
//!
//! Functions over samples treat NaN as a missing value. Reductions of an empty
//! sample return NaN rather than failing.
use chrono::TimeDelta;

use crate::error::ParameterError;

/// Tolerance for comparing doubles that went through different arithmetic.
pub const DOUBLE_TOLERANCE: f64 = 1e-8;

/// Probabilities of the whiskers, quartiles and median of a box plot.
pub const DEFAULT_BOX_PROBABILITIES: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

const NANOS_PER_MILLI: f64 = 1_000_000.0;

#[must_use]
pub fn double_equals(first: f64, second: f64, tolerance: f64) -> bool {
    (first - second).abs() < tolerance
}

/// Non-missing values in ascending order.
#[must_use]
pub fn sorted_present(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

#[must_use]
pub fn is_sorted(values: &[f64]) -> bool {
    values.windows(2).all(|w| match w {
        [a, b] => a <= b,
        _ => true,
    })
}

#[must_use]
pub fn sample_size(values: &[f64]) -> f64 {
    values.iter().filter(|v| !v.is_nan()).count() as f64
}

#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return f64::NAN;
    }
    sum / count as f64
}

#[must_use]
pub fn mean_absolute(values: &[f64]) -> f64 {
    let absolute: Vec<f64> = values.iter().map(|v| v.abs()).collect();
    mean(&absolute)
}

#[must_use]
pub fn minimum(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f64::min)
        .unwrap_or(f64::NAN)
}

#[must_use]
pub fn maximum(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .reduce(f64::max)
        .unwrap_or(f64::NAN)
}

#[must_use]
pub fn median(values: &[f64]) -> f64 {
    let sorted = sorted_present(values);
    let count = sorted.len();
    if count == 0 {
        return f64::NAN;
    }
    let upper = sorted.get(count / 2).copied().unwrap_or(f64::NAN);
    if count % 2 == 1 {
        return upper;
    }
    let lower = sorted.get(count / 2 - 1).copied().unwrap_or(f64::NAN);
    (lower + upper) / 2.0
}

/// Bias-corrected sample standard deviation. Zero for a single value.
#[must_use]
pub fn standard_deviation(values: &[f64]) -> f64 {
    let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    match present.len() {
        0 => f64::NAN,
        1 => 0.0,
        count => {
            let centre = mean(&present);
            let squares: f64 = present.iter().map(|v| (v - centre).powi(2)).sum();
            (squares / (count - 1) as f64).sqrt()
        }
    }
}

fn check_probability(probability: f64) -> Result<(), ParameterError> {
    if (0.0..=1.0).contains(&probability) {
        Ok(())
    } else {
        Err(ParameterError::InvalidProbability { probability })
    }
}

/// Quantile at `probability` using the plotting position `p(n + 1)` and linear
/// interpolation between neighbours. Positions outside the sample clamp to the
/// smallest or largest value.
///
/// # Errors
///
/// Returns an error when `probability` is outside `[0, 1]`.
pub fn quantile(probability: f64, values: &[f64]) -> Result<f64, ParameterError> {
    check_probability(probability)?;
    Ok(quantile_of_sorted(probability, &sorted_present(values)))
}

/// [`quantile`] for values already sorted with missing values removed.
#[must_use]
pub fn quantile_of_sorted(probability: f64, sorted: &[f64]) -> f64 {
    let (Some(&first), Some(&last)) = (sorted.first(), sorted.last()) else {
        return f64::NAN;
    };
    let count = sorted.len() as f64;
    let position = probability * (count + 1.0);
    if position < 1.0 {
        return first;
    }
    if position >= count {
        return last;
    }
    let floor = position.floor();
    let fraction = position - floor;
    let index = floor as usize;
    let lower = sorted.get(index - 1).copied().unwrap_or(first);
    let upper = sorted.get(index).copied().unwrap_or(last);
    lower + fraction * (upper - lower)
}

/// Equal-width histogram. Bin `i` covers `(lower_i, upper_i]`, the first bin is
/// closed below so the sample minimum lands in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub upper_bounds: Vec<f64>,
    pub counts: Vec<f64>,
}

/// # Errors
///
/// Returns an error when fewer than two bins are requested.
pub fn histogram(bins: u32, values: &[f64]) -> Result<Histogram, ParameterError> {
    if bins < 2 {
        return Err(ParameterError::TooFewBins { bins });
    }
    let bin_count = bins as usize;
    let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let lower = present.iter().copied().fold(f64::INFINITY, f64::min);
    let upper = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = (upper - lower) / f64::from(bins);

    let mut counts = vec![0.0; bin_count];
    for value in &present {
        let position = ((value - lower) / width).ceil() - 1.0;
        let index = if position.is_finite() {
            position.clamp(0.0, f64::from(bins - 1)) as usize
        } else {
            0
        };
        if let Some(count) = counts.get_mut(index) {
            *count += 1.0;
        }
    }

    let upper_bounds = (0..bins)
        .map(|i| {
            let bound = if i == bins - 1 {
                upper
            } else {
                width.mul_add(f64::from(i + 1), lower)
            };
            if bound.is_finite() { bound } else { f64::NAN }
        })
        .collect();

    Ok(Histogram {
        upper_bounds,
        counts,
    })
}

/// Round half away from zero to `places` decimal places.
#[must_use]
pub fn round(value: f64, places: i32) -> f64 {
    let scale = 10_f64.powi(places);
    (value * scale).round() / scale
}

/// `1 - score / reference`. Non-finite outcomes are reported as missing (NaN).
#[must_use]
pub fn skill(score: f64, reference: f64) -> f64 {
    let result = 1.0 - score / reference;
    if result.is_finite() { result } else { f64::NAN }
}

/// Signed duration as decimal milliseconds, keeping sub-millisecond precision.
#[must_use]
pub fn duration_to_millis(duration: TimeDelta) -> f64 {
    let seconds = duration.num_seconds();
    let nanos = duration.subsec_nanos();
    seconds as f64 * 1000.0 + f64::from(nanos) / NANOS_PER_MILLI
}

/// Decimal milliseconds rounded to the nearest whole millisecond. `None` when
/// the input is missing or out of range.
#[must_use]
pub fn millis_to_duration(millis: f64) -> Option<TimeDelta> {
    if !millis.is_finite() {
        return None;
    }
    let rounded = millis.round();
    if rounded.abs() > i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(rounded as i64)
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::{
        DOUBLE_TOLERANCE, double_equals, duration_to_millis, histogram, is_sorted, maximum,
        mean, mean_absolute, median, millis_to_duration, minimum, quantile, round, sample_size,
        skill, standard_deviation,
    };
    use crate::error::ParameterError;

    fn close(actual: f64, expected: f64) -> Result<(), String> {
        if double_equals(actual, expected, DOUBLE_TOLERANCE) {
            Ok(())
        } else {
            Err(format!("Expected {expected}, found {actual}"))
        }
    }

    #[test]
    fn reductions_skip_missing_values() -> Result<(), String> {
        let values = [4.0, f64::NAN, -2.0, 7.0, 1.0];
        close(mean(&values), 2.5)?;
        close(mean_absolute(&values), 3.5)?;
        close(minimum(&values), -2.0)?;
        close(maximum(&values), 7.0)?;
        close(median(&values), 2.5)?;
        close(sample_size(&values), 4.0)?;
        close(standard_deviation(&values), 3.872_983_346_207_417)?;
        if !mean(&[]).is_nan() || !median(&[f64::NAN]).is_nan() {
            return Err("Empty samples should reduce to NaN".to_owned());
        }
        close(standard_deviation(&[3.0]), 0.0)
    }

    #[test]
    fn quantile_interpolates_on_weibull_positions() -> Result<(), String> {
        let values = [1.0, 2.0, 3.0, 4.0];
        let q = |p| quantile(p, &values).map_err(|err| err.to_string());
        // 0.5 * 5 = 2.5: halfway between the second and third values.
        close(q(0.5)?, 2.5)?;
        close(q(0.3)?, 1.5)?;
        close(q(0.1)?, 1.0)?;
        close(q(0.9)?, 4.0)?;
        close(quantile(0.7, &[5.0]).map_err(|err| err.to_string())?, 5.0)?;
        if !quantile(0.5, &[f64::NAN]).map_err(|err| err.to_string())?.is_nan() {
            return Err("All-missing sample should give NaN".to_owned());
        }
        match quantile(1.5, &values) {
            Err(ParameterError::InvalidProbability { .. }) => Ok(()),
            other => Err(format!("Unexpected result: {other:?}")),
        }
    }

    #[test]
    fn histogram_counts_into_equal_width_bins() -> Result<(), String> {
        let values = [0.0, 1.0, 2.5, 5.0, 7.5, 10.0];
        let result = histogram(4, &values).map_err(|err| err.to_string())?;
        if result.upper_bounds != vec![2.5, 5.0, 7.5, 10.0] {
            return Err(format!("Unexpected bounds: {:?}", result.upper_bounds));
        }
        if result.counts != vec![3.0, 1.0, 1.0, 1.0] {
            return Err(format!("Unexpected counts: {:?}", result.counts));
        }
        match histogram(1, &values) {
            Err(ParameterError::TooFewBins { bins: 1 }) => Ok(()),
            other => Err(format!("Unexpected result: {other:?}")),
        }
    }

    #[test]
    fn histogram_of_constant_or_empty_sample() -> Result<(), String> {
        let constant = histogram(3, &[2.0, 2.0]).map_err(|err| err.to_string())?;
        if constant.counts != vec![2.0, 0.0, 0.0] {
            return Err(format!("Unexpected counts: {:?}", constant.counts));
        }
        let empty = histogram(2, &[]).map_err(|err| err.to_string())?;
        if empty.counts != vec![0.0, 0.0] || !empty.upper_bounds.iter().all(|b| b.is_nan()) {
            return Err(format!("Unexpected empty histogram: {empty:?}"));
        }
        Ok(())
    }

    #[test]
    fn skill_reports_undefined_ratios_as_missing() -> Result<(), String> {
        close(skill(1.0, 4.0), 0.75)?;
        if !skill(1.0, 0.0).is_nan() {
            return Err("Division by zero should be missing".to_owned());
        }
        Ok(())
    }

    #[test]
    fn rounding_and_sortedness() -> Result<(), String> {
        close(round(0.123_456_789_4, 8), 0.123_456_79)?;
        if !is_sorted(&[1.0, 1.0, 2.0]) || is_sorted(&[2.0, 1.0]) {
            return Err("Sortedness check is wrong".to_owned());
        }
        Ok(())
    }

    #[test]
    fn durations_convert_through_decimal_milliseconds() -> Result<(), String> {
        let duration = TimeDelta::seconds(-90) + TimeDelta::microseconds(1_500);
        close(duration_to_millis(duration), -89_998.5)?;
        if millis_to_duration(1_234.6) != Some(TimeDelta::milliseconds(1_235)) {
            return Err("Millisecond rounding is wrong".to_owned());
        }
        if millis_to_duration(f64::NAN).is_some() {
            return Err("NaN should not convert".to_owned());
        }
        Ok(())
    }
}
