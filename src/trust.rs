//! Trust aggregation and threshold filtering.
//!
//! All functions here are pure. Two distinct policies coexist in the engine
//! and must not be confused:
//!
//! - multiple signals about the *same* fact combine by **max** ("verified by
//!   at least one strong source"), implemented here;
//! - a chain of *different* facts aggregates by **min** (a path is only as
//!   trustworthy as its weakest link), implemented where paths are built.

/// Default minimum trust threshold, overridable per request.
pub const DEFAULT_MIN_TRUST: f64 = 0.7;

/// Clamp a raw signal to the valid trust range [0, 1].
pub fn clamp(score: f64) -> f64 {
    if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) }
}

/// Combine multiple raw signals asserting the same fact into one score.
///
/// Each signal is clamped individually, then the maximum wins: a well
/// attested fact is not averaged down by noisy additional sources. Returns
/// 0.0 for an empty signal set.
pub fn combine_signals(signals: &[f64]) -> f64 {
    signals.iter().copied().map(clamp).fold(0.0, f64::max)
}

/// Combine independent pieces of evidence for the same derived claim.
///
/// Same max policy as [`combine_signals`]; confidence is probability-like
/// and bounded at 1.0, so evidence is never summed.
pub fn combine_evidence(a: f64, b: f64) -> f64 {
    clamp(a).max(clamp(b))
}

/// Whether a score clears the caller's minimum trust threshold.
pub fn passes_threshold(score: f64, min_trust: f64) -> bool {
    score >= min_trust
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds_and_nan() {
        assert_eq!(clamp(1.5), 1.0);
        assert_eq!(clamp(-0.5), 0.0);
        assert_eq!(clamp(f64::NAN), 0.0);
        assert_eq!(clamp(0.42), 0.42);
    }

    #[test]
    fn max_of_signals_wins() {
        assert_eq!(combine_signals(&[0.3, 0.9, 0.5]), 0.9);
        // Out-of-range signals are clamped before combination.
        assert_eq!(combine_signals(&[0.3, 7.0]), 1.0);
        assert_eq!(combine_signals(&[]), 0.0);
    }

    #[test]
    fn evidence_is_bounded_not_summed() {
        assert_eq!(combine_evidence(0.8, 0.7), 0.8);
        assert!(combine_evidence(0.9, 0.9) <= 1.0);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(passes_threshold(0.7, 0.7));
        assert!(!passes_threshold(0.699, 0.7));
    }
}
