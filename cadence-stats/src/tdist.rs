//! Student's t Distribution
//!
//! Two-tailed critical values at 95% confidence, by degrees of freedom.

const T_TABLE: [f64; 30] = [
    12.706, 4.303, 3.182, 2.776, 2.571, 2.447, 2.365, 2.306, 2.262, 2.228, //
    2.201, 2.179, 2.160, 2.145, 2.131, 2.120, 2.110, 2.101, 2.093, 2.086, //
    2.080, 2.074, 2.069, 2.064, 2.060, 2.056, 2.052, 2.048, 2.045, 2.042,
];

/// Critical value of the t distribution for `df` degrees of freedom.
///
/// Beyond 30 degrees of freedom the normal approximation (1.96) is used.
/// Zero degrees of freedom has no finite interval and yields infinity.
pub fn t_critical(df: usize) -> f64 {
    match df {
        0 => f64::INFINITY,
        1..=30 => T_TABLE[df - 1],
        _ => 1.96,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookup() {
        assert_eq!(t_critical(1), 12.706);
        assert_eq!(t_critical(30), 2.042);
        assert_eq!(t_critical(31), 1.96);
        assert!(t_critical(0).is_infinite());
    }

    #[test]
    fn values_shrink_with_more_freedom() {
        for df in 1..40 {
            assert!(t_critical(df + 1) <= t_critical(df));
        }
    }
}
