//! Random number source port.

/// Supplies uniformly distributed integers. Injected wherever randomness
/// reaches persisted state so tests can pin the outcome.
pub trait RandomSource: Send + Sync {
    /// Uniform integer in `low..=high`.
    fn int_in_range(&self, low: i64, high: i64) -> i64;
}
