//! Top-N ranking of anomaly scores

use super::{check_lengths, FRAUD};
use crate::error::Result;

/// Row indices ordered by score, most anomalous (lowest) first.
///
/// Equal scores keep their input order.
pub fn ranked_indices(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
    order
}

/// Number of true-fraud rows among the `n` lowest-scored rows.
///
/// `n` beyond the row count covers the whole table.
pub fn fraud_in_top_n(scores: &[f64], labels: &[u8], n: usize) -> Result<usize> {
    check_lengths(scores.len(), labels.len())?;

    Ok(ranked_indices(scores)
        .into_iter()
        .take(n)
        .filter(|&i| labels[i] == FRAUD)
        .count())
}
