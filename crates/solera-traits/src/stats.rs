//! Statistical utility functions shared by the metric engine and reports.

/// Minimum threshold for standard deviation to avoid division by zero.
/// Values below this threshold are treated as zero variance.
pub const MIN_STD_THRESHOLD: f64 = 1e-10;

/// Arithmetic mean of the values, `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (N-1 denominator, Bessel's correction).
///
/// Returns `None` for fewer than two values.
///
/// # Examples
///
/// ```
/// use solera_traits::stats::sample_std;
///
/// let std = sample_std(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
/// assert!((std - 2.5_f64.sqrt()).abs() < 1e-12);
/// assert!(sample_std(&[1.0]).is_none());
/// ```
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    Some(variance.sqrt())
}

/// Fraction of values strictly greater than zero.
pub fn hit_rate(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let hits = values.iter().filter(|&&v| v > 0.0).count();
    Some(hits as f64 / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_basic() {
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0]).unwrap(), 2.0);
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn test_sample_std_uses_bessel() {
        // Population std would be sqrt(2), sample std is sqrt(2.5)
        let std = sample_std(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_relative_eq!(std, 2.5_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_sample_std_constant_values() {
        let std = sample_std(&[0.3, 0.3, 0.3, 0.3]).unwrap();
        assert!(std < MIN_STD_THRESHOLD);
    }

    #[test]
    fn test_hit_rate() {
        assert_relative_eq!(hit_rate(&[0.1, -0.2, 0.3, 0.0]).unwrap(), 0.5);
        assert!(hit_rate(&[]).is_none());
    }
}
