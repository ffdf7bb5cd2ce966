//! Activity-adaptive blend weights and rank-decay fusion.
//!
//! The weight schedule leans on content similarity for new users (too few
//! ratings for a useful neighborhood) and shifts toward collaborative
//! filtering as the rating history grows. Fusion scores each candidate by
//! its position within its source list rather than by the source's raw
//! score scale, so sources with incomparable score ranges can be combined.

use scorers::{Recommendation, ScoreSource, SourceContribution, rank};
use std::collections::HashMap;

/// Per-source blend weights for one request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    pub content: f32,
    pub collaborative: f32,
    pub popularity: f32,
}

/// Weight schedule keyed on the user's total rating count.
///
/// Boundaries are inclusive on the upper tier: exactly 5 ratings already
/// counts as medium activity, exactly 20 as active.
pub fn blend_weights(rating_count: usize) -> BlendWeights {
    if rating_count < 5 {
        BlendWeights {
            content: 0.6,
            collaborative: 0.1,
            popularity: 0.3,
        }
    } else if rating_count < 20 {
        BlendWeights {
            content: 0.5,
            collaborative: 0.3,
            popularity: 0.2,
        }
    } else {
        BlendWeights {
            content: 0.3,
            collaborative: 0.6,
            popularity: 0.1,
        }
    }
}

/// Fuse ranked source lists into one blended ranking.
///
/// A candidate at position `i` of a source list of length `n` contributes
/// `weight * (1 - i/n)`; contributions for the same movie sum across
/// sources and the per-source shares are kept in the breakdown. The fused
/// entries carry `ScoreSource::Hybrid`.
pub fn fuse(sources: &[(f32, Vec<Recommendation>)], limit: usize) -> Vec<Recommendation> {
    let mut merged: HashMap<u32, Recommendation> = HashMap::new();

    for (weight, recommendations) in sources {
        let len = recommendations.len();
        for (i, candidate) in recommendations.iter().enumerate() {
            let positional = weight * (1.0 - i as f32 / len as f32);
            let contribution = SourceContribution {
                source: candidate.source,
                score: positional,
            };
            merged
                .entry(candidate.movie_id)
                .and_modify(|existing| {
                    existing.score += positional;
                    existing.breakdown.push(contribution);
                })
                .or_insert_with(|| Recommendation {
                    movie_id: candidate.movie_id,
                    score: positional,
                    source: ScoreSource::Hybrid,
                    breakdown: vec![contribution],
                });
        }
    }

    rank(merged.into_values().collect(), limit)
}
