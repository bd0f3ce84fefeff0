//! Similarity search stage.
//!
//! One adapter query, timed, with engine distances normalized into
//! relevance scores. Higher relevance means a closer semantic match; the
//! conversion from cosine distance is `1 − distance`.

use std::time::Instant;

use crate::schema::{SearchRequest, SearchResponse, SearchResult};
use crate::stores::ChunkStore;
use crate::types::RetrievalError;

/// Runs the nearest-neighbor query for a validated request.
///
/// When the request does not ask for scores, results carry none; otherwise
/// every result carries one. The response's `search_time_ms` measures the
/// adapter call alone.
///
/// # Errors
///
/// Propagates the adapter's [`RetrievalError::Operation`]; the pipeline
/// does not proceed past this stage on failure.
pub async fn execute(
    store: &ChunkStore,
    request: &SearchRequest,
) -> Result<SearchResponse, RetrievalError> {
    tracing::debug!(
        k = request.k,
        include_scores = request.include_scores,
        has_filter = request.filter.is_some(),
        "starting similarity search"
    );

    let started = Instant::now();
    let hits = store
        .query(&request.query, request.k, request.filter.as_ref())
        .await?;
    let search_time_ms = started.elapsed().as_secs_f64() * 1000.0;

    let results: Vec<SearchResult> = hits
        .into_iter()
        .map(|hit| {
            let relevance_score = request.include_scores.then(|| 1.0 - hit.distance);
            SearchResult {
                content: hit.content,
                metadata: hit.metadata,
                relevance_score,
            }
        })
        .collect();

    tracing::info!(
        found = results.len(),
        duration_ms = search_time_ms,
        "similarity search completed"
    );

    Ok(SearchResponse {
        query: request.query.clone(),
        total_found: results.len(),
        results,
        search_time_ms,
    })
}
