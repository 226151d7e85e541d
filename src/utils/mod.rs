use nalgebra::DVector;

pub mod validation;

/// Norms below this are treated as zero (constant or empty vectors).
pub const DEGENERATE_NORM: f64 = 1e-9;

pub fn cosine_similarity(a: &DVector<f64>, b: &DVector<f64>) -> f64 {
    let norm_a = a.norm();
    let norm_b = b.norm();

    if norm_a < DEGENERATE_NORM || norm_b < DEGENERATE_NORM {
        0.0
    } else {
        (a.dot(b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

/// Pearson correlation, `None` when either vector has no variance.
pub fn pearson_correlation(a: &DVector<f64>, b: &DVector<f64>) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }

    let centered_a = a.add_scalar(-a.mean());
    let centered_b = b.add_scalar(-b.mean());
    let norm_a = centered_a.norm();
    let norm_b = centered_b.norm();

    if norm_a < DEGENERATE_NORM || norm_b < DEGENERATE_NORM {
        None
    } else {
        Some((centered_a.dot(&centered_b) / (norm_a * norm_b)).clamp(-1.0, 1.0))
    }
}

/// Weighted mean of `(value, weight)` pairs, `None` when the weights sum to zero.
pub fn weighted_mean<I>(pairs: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (value, weight) in pairs {
        numerator += value * weight;
        denominator += weight;
    }

    if denominator.abs() < DEGENERATE_NORM {
        None
    } else {
        Some(numerator / denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = DVector::from_vec(vec![1.0, 0.0, 0.0]);
        let b = DVector::from_vec(vec![0.0, 1.0, 0.0]);
        assert_eq!(cosine_similarity(&a, &b), 0.0);

        let a = DVector::from_vec(vec![2.0, 2.0]);
        let b = DVector::from_vec(vec![1.0, 1.0]);
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-12);

        let zero = DVector::from_vec(vec![0.0, 0.0]);
        assert_eq!(cosine_similarity(&zero, &b), 0.0);
    }

    #[test]
    fn test_pearson_correlation() {
        let a = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let b = DVector::from_vec(vec![2.0, 4.0, 6.0]);
        assert!((pearson_correlation(&a, &b).unwrap() - 1.0).abs() < 1e-12);

        let c = DVector::from_vec(vec![3.0, 2.0, 1.0]);
        assert!((pearson_correlation(&a, &c).unwrap() + 1.0).abs() < 1e-12);

        let constant = DVector::from_vec(vec![4.0, 4.0, 4.0]);
        assert_eq!(pearson_correlation(&a, &constant), None);

        let single = DVector::from_vec(vec![4.0]);
        assert_eq!(pearson_correlation(&single, &single), None);
    }

    #[test]
    fn test_weighted_mean() {
        assert_eq!(weighted_mean(vec![(4.0, 0.5), (2.0, 0.5)]), Some(3.0));
        assert_eq!(weighted_mean(vec![(4.0, 1.0), (1.0, 0.0)]), Some(4.0));
        assert_eq!(weighted_mean(Vec::<(f64, f64)>::new()), None);
    }
}
