//! Small combinatorial helpers used by the formula builtins.

use statrs::function::gamma::ln_gamma;

/// Binomial coefficient `C(n, k)` for real-valued inputs.
///
/// Arguments are rounded to the nearest integer first (formula calls pass
/// doubles). Out-of-range `k` yields 0; `C(n, 0) = C(n, n) = 1` exactly.
pub fn binomial(n: f64, k: f64) -> f64 {
    let n = n.round();
    let k = k.round();
    if n < 0.0 || k < 0.0 || k > n {
        return 0.0;
    }
    if k == 0.0 || k == n {
        return 1.0;
    }
    // exp(lnΓ(n+1) − lnΓ(k+1) − lnΓ(n−k+1)), rounded back to the integer
    // lattice while the result is exactly representable.
    let r = (ln_gamma(n + 1.0) - ln_gamma(k + 1.0) - ln_gamma(n - k + 1.0)).exp();
    if r < 9.007_199_254_740_992e15 { r.round() } else { r }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_coefficients() {
        assert_eq!(binomial(0.0, 0.0), 1.0);
        assert_eq!(binomial(5.0, 0.0), 1.0);
        assert_eq!(binomial(5.0, 5.0), 1.0);
        assert_eq!(binomial(5.0, 2.0), 10.0);
        assert_eq!(binomial(10.0, 3.0), 120.0);
        assert_eq!(binomial(49.0, 6.0), 13_983_816.0);
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(binomial(5.0, 6.0), 0.0);
        assert_eq!(binomial(5.0, -1.0), 0.0);
        assert_eq!(binomial(-2.0, 1.0), 0.0);
    }

    #[test]
    fn test_rounds_real_arguments() {
        assert_eq!(binomial(5.2, 1.9), 10.0);
    }
}
