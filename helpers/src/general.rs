#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// argsort returns the indices that would sort an array. The sort is stable, i.e. equal values
/// keep their input order. NaN values are treated as equal to everything.
pub fn argsort<T: std::cmp::PartialOrd>(x: &[T], order: SortOrder) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..x.len()).collect();
    match order {
        SortOrder::Ascending => indices.sort_by(|&a, &b| {
            x[a].partial_cmp(&x[b]).unwrap_or(std::cmp::Ordering::Equal)
        }),
        SortOrder::Descending => indices.sort_by(|&a, &b| {
            x[b].partial_cmp(&x[a]).unwrap_or(std::cmp::Ordering::Equal)
        }),
    }
    indices
}

/// lin_interp returns the linearly interpolated value at x for given discrete data points xp, fp.
/// xp must be increasing. Values outside the data range are clamped to the first/last value.
/// Inspired by numpy.interp.
///
/// Returns 0.0 for empty input.
pub fn lin_interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    debug_assert_eq!(xp.len(), fp.len(), "Number of items in xp and fp must be equal!");

    let n = xp.len().min(fp.len());
    if n == 0 {
        return 0.0;
    }

    if x <= xp[0] {
        return fp[0];
    }

    for i in 1..n {
        if x <= xp[i] {
            let dx = xp[i] - xp[i - 1];
            if dx <= 0.0 {
                return fp[i];
            }
            return fp[i - 1] + (x - xp[i - 1]) * (fp[i] - fp[i - 1]) / dx;
        }
    }

    fp[n - 1]
}

/// is_non_decreasing checks that every element is greater than or equal to its predecessor.
pub fn is_non_decreasing(x: &[f64]) -> bool {
    x.windows(2).all(|w| w[1] >= w[0])
}
