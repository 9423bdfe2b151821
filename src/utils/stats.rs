//! Statistical utility functions.

/// Calculate the mean of a slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate the variance of a slice with `ddof` delta degrees of freedom.
///
/// `ddof = 1` is the sample variance, `ddof = 0` the population variance.
pub fn variance_ddof(values: &[f64], ddof: usize) -> f64 {
    if values.len() <= ddof {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    sum_sq / (values.len() - ddof) as f64
}

/// Calculate the variance of a slice (sample variance with n-1 denominator).
pub fn variance(values: &[f64]) -> f64 {
    variance_ddof(values, 1)
}

/// Calculate the standard deviation of a slice (n-1 denominator).
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Population standard deviation (n denominator).
pub fn population_std_dev(values: &[f64]) -> f64 {
    variance_ddof(values, 0).sqrt()
}

/// Biased central moment of the given order: `mean((x - mean)^order)`.
pub fn central_moment(values: &[f64], order: i32) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|x| (x - m).powi(order)).sum::<f64>() / values.len() as f64
}
