//! Server selection policy.
//!
//! A pure fold over a pool snapshot, so running it twice on the same
//! snapshot always yields the same winner. The ranking is
//! liveness → block height with tolerance → response time:
//!
//! 1. failed candidates are skipped outright;
//! 2. a candidate more than `allowed_blocks_behind` blocks ahead of the
//!    running winner replaces it regardless of latency;
//! 3. at equal height, the faster candidate replaces the winner.
//!
//! Both displacement rules are strict inequalities, so the incumbent wins
//! ties and earlier list position acts as the implicit tie-breaker.

use std::sync::Arc;

use super::endpoint::NodeSnapshot;

/// The winning endpoint of a selection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selected {
    pub index: usize,
    pub url: Arc<str>,
}

/// Chooses the best endpoint from a pool snapshot.
///
/// Returns `None` when every candidate is failed (or the pool is empty).
/// The synthetic initial winner sits at height `i64::MIN` with the worst
/// possible latency, so any live candidate displaces it.
#[must_use]
pub fn select_node(candidates: &[NodeSnapshot], allowed_blocks_behind: i64) -> Option<Selected> {
    let mut winner: Option<&NodeSnapshot> = None;
    let mut winner_block = i64::MIN;
    let mut winner_response_time = u64::MAX;

    for candidate in candidates {
        if candidate.failed {
            continue;
        }

        let ahead = candidate.last_block.saturating_sub(allowed_blocks_behind) > winner_block;
        let same_height_faster = candidate.last_block == winner_block &&
            candidate.last_response_time_ms < winner_response_time;

        if ahead || same_height_faster {
            winner = Some(candidate);
            winner_block = candidate.last_block;
            winner_response_time = candidate.last_response_time_ms;
        }
    }

    winner.map(|snapshot| Selected { index: snapshot.index, url: Arc::clone(&snapshot.url) })
}
