//! Shared output types and the scorer trait.

use crate::error::Result;
use crate::mood::Mood;
use catalog::{CatalogSnapshot, Genre, MovieId, TrendingPeriod, UserId};
use serde::Serialize;
use std::collections::HashSet;

/// Which scoring strategy produced (or contributed to) a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreSource {
    Content,
    Collaborative,
    Mood,
    Group,
    Popularity,
    Hybrid,
}

/// One source's share of a blended score
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SourceContribution {
    pub source: ScoreSource,
    pub score: f32,
}

/// A single ranked recommendation.
///
/// Transient: produced per request and handed to the API layer, never
/// persisted by the core. `breakdown` carries the per-source contributions
/// for blended results; single-source scorers emit one entry.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub movie_id: MovieId,
    pub score: f32,
    pub source: ScoreSource,
    pub breakdown: Vec<SourceContribution>,
}

impl Recommendation {
    /// Create a recommendation attributed to a single source
    pub fn new(movie_id: MovieId, source: ScoreSource, score: f32) -> Self {
        Self {
            movie_id,
            score,
            source,
            breakdown: vec![SourceContribution { source, score }],
        }
    }
}

/// Structured justification for a single (user, movie) recommendation
#[derive(Debug, Clone, Serialize)]
pub enum Explanation {
    /// "Similar to a movie you rated highly"
    Content {
        reason: String,
        anchor_title: String,
        anchor_rating: f32,
        similarity: f32,
        shared_genres: Vec<Genre>,
        shared_themes: Vec<&'static str>,
    },
    /// "Users like you rated this highly"
    Collaborative {
        reason: String,
        supporting_users: usize,
        average_rating: f32,
    },
    /// "Fits this mood"
    Mood {
        reason: String,
        mood: Mood,
        mood_score: f32,
        matching_genres: Vec<Genre>,
    },
    /// "Balances the whole group's tastes"
    Group {
        reason: String,
        shared_genres: Vec<Genre>,
        quality_rating: f32,
    },
    /// "Currently trending"
    Trending {
        reason: String,
        period: TrendingPeriod,
    },
}

impl Explanation {
    /// The human-readable reason line
    pub fn reason(&self) -> &str {
        match self {
            Explanation::Content { reason, .. }
            | Explanation::Collaborative { reason, .. }
            | Explanation::Mood { reason, .. }
            | Explanation::Group { reason, .. }
            | Explanation::Trending { reason, .. } => reason,
        }
    }

    /// Short label for the explanation type
    pub fn kind(&self) -> &'static str {
        match self {
            Explanation::Content { .. } => "content_based",
            Explanation::Collaborative { .. } => "collaborative",
            Explanation::Mood { .. } => "mood_based",
            Explanation::Group { .. } => "group_consensus",
            Explanation::Trending { .. } => "trending",
        }
    }
}

/// Capability contract every concrete scorer implements.
///
/// The hybrid engine only depends on this trait, so any type providing
/// {recommend, explain} is substitutable as a blend source.
pub trait Scorer: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Ranked recommendations for a user, highest score first
    fn recommend(&self, user_id: UserId, limit: usize) -> Result<Vec<Recommendation>>;

    /// Why this movie suits this user, if the scorer has a story to tell
    fn explain(&self, user_id: UserId, movie_id: MovieId) -> Option<Explanation>;
}

/// Sort recommendations by score descending, breaking ties by movie id so
/// repeated runs over unchanged data stay rank-order stable, then truncate.
pub fn rank(mut recommendations: Vec<Recommendation>, limit: usize) -> Vec<Recommendation> {
    recommendations.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.movie_id.cmp(&b.movie_id))
    });
    recommendations.truncate(limit);
    recommendations
}

/// Popularity ranking used whenever a scorer lacks the data to do better.
/// Already-excluded movies never appear in the result.
pub fn popularity_fallback(
    snapshot: &CatalogSnapshot,
    exclude: &HashSet<MovieId>,
    limit: usize,
) -> Vec<Recommendation> {
    snapshot
        .popular_movies(limit + exclude.len())
        .into_iter()
        .filter(|id| !exclude.contains(id))
        .take(limit)
        .map(|id| {
            let popularity = snapshot.movie(id).map_or(0.0, |m| m.popularity);
            Recommendation::new(id, ScoreSource::Popularity, popularity)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_orders_desc_with_id_tiebreak() {
        let recs = vec![
            Recommendation::new(3, ScoreSource::Content, 0.5),
            Recommendation::new(1, ScoreSource::Content, 0.9),
            Recommendation::new(2, ScoreSource::Content, 0.5),
        ];

        let ranked = rank(recs, 10);
        let ids: Vec<_> = ranked.iter().map(|r| r.movie_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_rank_truncates() {
        let recs = (0..10)
            .map(|i| Recommendation::new(i, ScoreSource::Content, i as f32))
            .collect();
        assert_eq!(rank(recs, 3).len(), 3);
    }
}
