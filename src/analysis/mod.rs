//! Analysis modules.
//!
//! Contribution scoring, peer review aggregation and anomaly flagging.
//! Every function here is a pure transformation of the snapshot it is
//! given; nothing is cached between runs.

pub mod anomaly;
pub mod assembler;
pub mod contribution;
pub mod reviews;

pub use assembler::{analyze, assemble_payload};

/// Divide and round to the nearest integer, halves rounding up.
///
/// Computes `floor(numerator / denominator + 0.5)` on integers, so the
/// result never depends on floating point representation.
/// `denominator` must be positive.
pub(crate) fn div_round_half_up(numerator: i64, denominator: i64) -> i64 {
    debug_assert!(denominator > 0);
    (2 * numerator + denominator).div_euclid(2 * denominator)
}

/// Mean of `sum / count` rounded to one decimal place.
pub(crate) fn mean_one_decimal(sum: i64, count: i64) -> f64 {
    div_round_half_up(sum * 10, count) as f64 / 10.0
}
