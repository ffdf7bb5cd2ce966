//! Collaborative scorer: "users with your taste loved these".
//!
//! ## Algorithm
//! 1. Keep users with >= 5 ratings and movies with >= 5 ratings; bail out
//!    with `InsufficientData` when fewer than 50 triples survive.
//! 2. Build a dense zero-filled user x movie rating matrix over sorted ids.
//! 3. Pairwise user similarity = raw cosine over the rating rows. Unrated
//!    cells count as zeros, which biases toward users who rated the same
//!    movies; that bias is intentional and documented.
//! 4. At query time, walk the 50 most similar neighbors (similarity > 0.1)
//!    and accumulate `similarity * neighbor_rating / 5.0` for every movie
//!    they loved that the target user hasn't seen.

use crate::arena::IdArena;
use crate::error::{Result, ScoreError};
use crate::text::cosine;
use crate::types::{
    Explanation, Recommendation, ScoreSource, Scorer, popularity_fallback, rank,
};
use catalog::{CatalogSnapshot, MovieId, UserId};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Minimum ratings a user needs to enter the matrix
const MIN_USER_RATINGS: usize = 5;

/// Minimum ratings a movie needs to enter the matrix
const MIN_MOVIE_RATINGS: usize = 5;

/// Minimum surviving (user, movie, rating) triples to build at all
const MIN_TRIPLES: usize = 50;

/// Neighborhood size consulted per recommendation request
const MAX_NEIGHBORS: usize = 50;

/// Neighbors below this cosine similarity are ignored
const MIN_SIMILARITY: f32 = 0.1;

/// Neighbor ratings at or above this count as endorsements
const ENDORSEMENT_RATING: f32 = 4.0;

/// Neighbors consulted when explaining a single movie
const EXPLAIN_NEIGHBORS: usize = 20;

/// Dense user-user similarity model over the filtered rating matrix
#[derive(Debug)]
pub struct CollaborativeModel {
    users: IdArena<UserId>,
    movies: IdArena<MovieId>,
    /// Row-major user x movie rating matrix, zero = unrated
    ratings: Vec<Vec<f32>>,
    /// Row-major symmetric user x user cosine similarity matrix
    similarity: Vec<Vec<f32>>,
}

impl CollaborativeModel {
    /// Build the user-similarity model from a catalog snapshot.
    #[instrument(skip(snapshot), fields(users, movies))]
    pub fn build(snapshot: &CatalogSnapshot) -> Result<Self> {
        let mut per_movie: HashMap<MovieId, usize> = HashMap::new();
        for rating in snapshot.all_ratings() {
            *per_movie.entry(rating.movie_id).or_insert(0) += 1;
        }

        let mut user_ids: Vec<UserId> = snapshot
            .all_ratings()
            .map(|r| r.user_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .filter(|&u| snapshot.rating_count(u) >= MIN_USER_RATINGS)
            .collect();
        user_ids.sort_unstable();

        let mut movie_ids: Vec<MovieId> = per_movie
            .iter()
            .filter(|&(_, &count)| count >= MIN_MOVIE_RATINGS)
            .map(|(&id, _)| id)
            .collect();
        movie_ids.sort_unstable();

        let users = IdArena::from_ids(user_ids);
        let movies = IdArena::from_ids(movie_ids);

        let mut ratings = vec![vec![0.0f32; movies.len()]; users.len()];
        let mut triples = 0usize;
        for (i, &user_id) in users.ids().iter().enumerate() {
            for rating in snapshot.ratings_for_user(user_id) {
                if let Some(j) = movies.index_of(rating.movie_id) {
                    ratings[i][j] = rating.rating;
                    triples += 1;
                }
            }
        }

        if triples < MIN_TRIPLES {
            return Err(ScoreError::InsufficientData {
                needed: MIN_TRIPLES,
                found: triples,
            });
        }

        tracing::Span::current().record("users", users.len() as u64);
        tracing::Span::current().record("movies", movies.len() as u64);

        let n = users.len();
        let similarity: Vec<Vec<f32>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (0..n)
                    .map(|j| {
                        if i == j {
                            1.0
                        } else {
                            cosine(&ratings[i], &ratings[j])
                        }
                    })
                    .collect()
            })
            .collect();

        debug!(users = n, movies = movies.len(), triples, "built user similarity matrix");

        Ok(Self {
            users,
            movies,
            ratings,
            similarity,
        })
    }

    /// Similarity between two indexed users, if both are in the matrix
    pub fn user_similarity(&self, a: UserId, b: UserId) -> Option<f32> {
        let i = self.users.index_of(a)?;
        let j = self.users.index_of(b)?;
        Some(self.similarity[i][j])
    }

    /// Whether a user participates in the matrix
    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.users.contains(user_id)
    }

    /// The user's neighbors above the similarity floor, most similar first,
    /// capped at `limit`. Id-ascending tie-break keeps the order stable.
    fn neighbors(&self, user_index: usize, limit: usize) -> Vec<(usize, f32)> {
        let mut neighbors: Vec<(usize, f32)> = self.similarity[user_index]
            .iter()
            .enumerate()
            .filter(|&(j, &sim)| j != user_index && sim > MIN_SIMILARITY)
            .map(|(j, &sim)| (j, sim))
            .collect();
        neighbors.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        neighbors.truncate(limit);
        neighbors
    }
}

/// Collaborative scorer over a built model and its source snapshot
pub struct CollaborativeScorer {
    snapshot: Arc<CatalogSnapshot>,
    model: CollaborativeModel,
}

impl CollaborativeScorer {
    pub fn new(snapshot: Arc<CatalogSnapshot>, model: CollaborativeModel) -> Self {
        Self { snapshot, model }
    }

    pub fn model(&self) -> &CollaborativeModel {
        &self.model
    }

}

/// Movies the user's friends loved that the user hasn't seen.
///
/// Ranked by average friend rating, then by how many friends endorsed the
/// movie. Works off the raw ratings, so it never needs a trained model.
#[instrument(skip(snapshot, friend_ids), fields(friends = friend_ids.len()))]
pub fn friend_recommendations(
    snapshot: &CatalogSnapshot,
    user_id: UserId,
    friend_ids: &[UserId],
    limit: usize,
) -> Vec<Recommendation> {
    let rated = snapshot.rated_movie_ids(user_id);

    let mut endorsements: HashMap<MovieId, (f32, u32)> = HashMap::new();
    for &friend_id in friend_ids {
        for rating in snapshot.ratings_for_user(friend_id) {
            if rating.rating >= ENDORSEMENT_RATING && !rated.contains(&rating.movie_id) {
                let entry = endorsements.entry(rating.movie_id).or_insert((0.0, 0));
                entry.0 += rating.rating;
                entry.1 += 1;
            }
        }
    }

    let mut candidates: Vec<(MovieId, f32, u32)> = endorsements
        .into_iter()
        .map(|(movie_id, (sum, count))| (movie_id, sum / count as f32, count))
        .collect();
    candidates.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.2.cmp(&a.2))
            .then_with(|| a.0.cmp(&b.0))
    });
    candidates.truncate(limit);

    candidates
        .into_iter()
        .map(|(movie_id, avg, _)| Recommendation::new(movie_id, ScoreSource::Collaborative, avg / 5.0))
        .collect()
}

impl Scorer for CollaborativeScorer {
    fn name(&self) -> &'static str {
        "collaborative"
    }

    #[instrument(skip(self), fields(scorer = self.name()))]
    fn recommend(&self, user_id: UserId, limit: usize) -> Result<Vec<Recommendation>> {
        let rated = self.snapshot.rated_movie_ids(user_id);

        let Some(user_index) = self.model.users.index_of(user_id) else {
            debug!(user_id, "user not in matrix, falling back to popularity");
            return Ok(popularity_fallback(&self.snapshot, &rated, limit));
        };

        let mut scores: HashMap<MovieId, f32> = HashMap::new();
        for (neighbor_index, similarity) in self.model.neighbors(user_index, MAX_NEIGHBORS) {
            for (movie_index, &neighbor_rating) in
                self.model.ratings[neighbor_index].iter().enumerate()
            {
                if neighbor_rating < ENDORSEMENT_RATING {
                    continue;
                }
                let Some(movie_id) = self.model.movies.id_at(movie_index) else {
                    continue;
                };
                if rated.contains(&movie_id) {
                    continue;
                }
                *scores.entry(movie_id).or_insert(0.0) += similarity * neighbor_rating / 5.0;
            }
        }

        if scores.is_empty() {
            return Ok(popularity_fallback(&self.snapshot, &rated, limit));
        }

        let candidates = scores
            .into_iter()
            .map(|(movie_id, score)| {
                Recommendation::new(movie_id, ScoreSource::Collaborative, score)
            })
            .collect();
        Ok(rank(candidates, limit))
    }

    /// How many of the user's closest neighbors endorsed this movie, and at
    /// what average rating.
    fn explain(&self, user_id: UserId, movie_id: MovieId) -> Option<Explanation> {
        let user_index = self.model.users.index_of(user_id)?;
        let movie_index = self.model.movies.index_of(movie_id)?;

        let mut sum = 0.0f32;
        let mut count = 0usize;
        for (neighbor_index, _) in self.model.neighbors(user_index, EXPLAIN_NEIGHBORS) {
            let neighbor_rating = self.model.ratings[neighbor_index][movie_index];
            if neighbor_rating >= ENDORSEMENT_RATING {
                sum += neighbor_rating;
                count += 1;
            }
        }
        if count == 0 {
            return None;
        }

        let average_rating = sum / count as f32;
        Some(Explanation::Collaborative {
            reason: format!(
                "{} users with similar taste rated this {:.1} on average",
                count, average_rating
            ),
            supporting_users: count,
            average_rating,
        })
    }
}
