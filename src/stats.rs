// ==============================================================================
// stats.rs - Closed-Form Statistical Transforms
// ==============================================================================
// Description: P-value to chi-square conversion and signed effect-size estimate
// Author: Matt Barham
// Created: 2026-08-10
// Modified: 2026-08-27
// Version: 1.0.0
// ==============================================================================

use statrs::function::erf::erfc_inv;

/// Convert a two-sided GWAS p-value into a 1-df chi-square statistic.
///
/// This is the inverse survival function of the chi-square distribution with
/// one degree of freedom. For df = 1 the survival function is
/// `sf(x) = erfc(sqrt(x / 2))`, so the inverse is `2 * erfc_inv(p)^2`. Going
/// through `erfc_inv` directly keeps full precision for genome-wide
/// significant p-values (1e-8 and far below), where `1 - p` would round to 1.
///
/// # Arguments
/// * `p` - P-value in (0, 1]. Callers are expected to have range-checked
///   with [`crate::checks::check_p_values`] first.
///
/// # Returns
/// * Chi-square statistic in [0, inf). `p = 1` maps to exactly 0.
pub fn chi_square_from_p(p: f64) -> f64 {
    let z = erfc_inv(p);
    2.0 * z * z
}

/// Signed per-SNP effect-size estimate ("betahat").
///
/// `sqrt(chisq / n) * direction`, where `direction` is +1 or -1 depending on
/// the sign of the underlying regression coefficient.
pub fn signed_effect(chisq: f64, n: f64, direction: i64) -> f64 {
    (chisq / n).sqrt() * direction as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_chi_square_from_p_reference_values() {
        // Reference values from scipy.special.chdtri(1, p)
        assert_close(chi_square_from_p(0.05), 3.841458820694124, 1e-9);
        assert_close(chi_square_from_p(0.5), 0.454936423119573, 1e-9);
        assert_close(chi_square_from_p(0.01), 6.634896601021215, 1e-9);
        assert_close(chi_square_from_p(5e-8), 29.716785276960813, 1e-7);
    }

    #[test]
    fn test_chi_square_from_p_boundary() {
        // p = 1 carries zero association signal
        assert_close(chi_square_from_p(1.0), 0.0, 1e-12);
    }

    #[test]
    fn test_chi_square_from_p_tiny_p() {
        // Must not collapse to inf or lose precision for sub-double-epsilon p
        let chisq = chi_square_from_p(1e-300);
        assert!(chisq.is_finite());
        assert!(chisq > 1000.0);

        // Monotone: smaller p, larger chi-square
        assert!(chi_square_from_p(1e-10) > chi_square_from_p(1e-8));
    }

    #[test]
    fn test_signed_effect() {
        // chisq = 4, n = 10000 -> |betahat| = sqrt(4 / 10000) = 0.02
        assert_close(signed_effect(4.0, 10_000.0, 1), 0.02, 1e-12);
        assert_close(signed_effect(4.0, 10_000.0, -1), -0.02, 1e-12);
        assert_close(signed_effect(0.0, 10_000.0, 1), 0.0, 1e-12);
    }

    #[test]
    fn test_p_to_chisq_to_effect_round() {
        // p = 0.05, n = 40000, negative direction
        let chisq = chi_square_from_p(0.05);
        let betahat = signed_effect(chisq, 40_000.0, -1);
        assert_close(betahat, -(3.841458820694124f64 / 40_000.0).sqrt(), 1e-12);
    }
}
