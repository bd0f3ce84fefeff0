//! Relevance reranking.
//!
//! A pure permutation: results are stable-sorted by relevance score
//! descending. A missing score orders as 0.0 but is never written back
//! into the result, and ties keep their prior relative order. The stage
//! cannot fail and never changes `total_found`.

use crate::schema::SearchResponse;

/// Stable-sorts the response by relevance, highest first.
#[must_use]
pub fn rerank(mut response: SearchResponse) -> SearchResponse {
    tracing::debug!(count = response.total_found, "reranking chunks");
    response.results.sort_by(|a, b| {
        let left = a.relevance_score.unwrap_or(0.0);
        let right = b.relevance_score.unwrap_or(0.0);
        right.total_cmp(&left)
    });
    response
}
