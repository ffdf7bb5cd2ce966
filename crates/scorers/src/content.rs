//! Content-based scorer: "more like the movies you loved".
//!
//! ## Algorithm
//! 1. Collect eligible movies (vote_count >= 10, non-empty overview) in
//!    ascending id order so matrix positions are deterministic.
//! 2. TF-IDF vectorize each movie's overview + tagline + genre names
//!    (vocabulary capped at 5000 terms).
//! 3. Standard-scale the numeric features (vote_average, popularity,
//!    runtime, release year).
//! 4. Blend: `sim = 0.7 * cosine(text) + 0.3 * cosine(numeric)`, computed
//!    as a full symmetric matrix with rows built in parallel.
//! 5. At query time, walk a user's highly rated anchors and average each
//!    neighbor's `similarity * rating / 5.0` contributions.

use crate::arena::IdArena;
use crate::error::{Result, ScoreError};
use crate::text::{SparseVector, TfIdfVectorizer, cosine, tokenize};
use crate::types::{
    Explanation, Recommendation, ScoreSource, Scorer, popularity_fallback, rank,
};
use catalog::{CatalogSnapshot, Genre, Movie, MovieId, UserId};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Minimum eligible movies needed to build a useful similarity matrix
const MIN_MOVIES: usize = 10;

/// Minimum catalog vote count for a movie to enter the matrix
const MIN_VOTE_COUNT: u32 = 10;

/// Vocabulary cap for the TF-IDF pass
const MAX_FEATURES: usize = 5000;

/// Blend weights for the text and numeric similarity components
const TEXT_WEIGHT: f32 = 0.7;
const NUMERIC_WEIGHT: f32 = 0.3;

/// Ratings at or above this mark a movie as an anchor the user loved
const ANCHOR_RATING: f32 = 4.0;

/// Neighbors fetched per anchor when accumulating recommendations
const NEIGHBORS_PER_ANCHOR: usize = 20;

/// Keyword themes surfaced in explanations when both movies mention them
const THEMES: &[(&str, &[&str])] = &[
    ("action", &["fight", "battle", "war", "explosion", "chase"]),
    ("romance", &["love", "romance", "relationship", "heart"]),
    ("adventure", &["journey", "quest", "adventure", "explore"]),
    ("mystery", &["mystery", "secret", "detective", "clue"]),
    ("family", &["family", "father", "mother", "son", "daughter"]),
    ("friendship", &["friend", "friendship", "loyalty", "bond"]),
];

/// Precomputed movie-to-movie similarity matrix
#[derive(Debug)]
pub struct ContentModel {
    arena: IdArena<MovieId>,
    /// Row-major symmetric matrix, dimension = arena.len()
    rows: Vec<Vec<f32>>,
}

impl ContentModel {
    /// Build the similarity matrix from a catalog snapshot.
    ///
    /// Fails with `InsufficientData` when fewer than 10 movies qualify.
    #[instrument(skip(snapshot), fields(movies))]
    pub fn build(snapshot: &CatalogSnapshot) -> Result<Self> {
        let mut eligible: Vec<&Movie> = snapshot
            .all_movies()
            .filter(|m| {
                m.vote_count >= MIN_VOTE_COUNT
                    && m.overview.as_deref().is_some_and(|o| !o.trim().is_empty())
            })
            .collect();
        eligible.sort_by_key(|m| m.id);

        if eligible.len() < MIN_MOVIES {
            return Err(ScoreError::InsufficientData {
                needed: MIN_MOVIES,
                found: eligible.len(),
            });
        }

        tracing::Span::current().record("movies", eligible.len() as u64);

        let corpus: Vec<Vec<String>> = eligible
            .par_iter()
            .map(|m| tokenize(&m.content_text()))
            .collect();
        let vectorizer = TfIdfVectorizer::fit(&corpus, MAX_FEATURES);
        let text_vectors: Vec<SparseVector> = corpus
            .par_iter()
            .map(|tokens| vectorizer.transform(tokens))
            .collect();

        let numeric_rows = scale_numeric_features(&eligible);

        let n = eligible.len();
        let rows: Vec<Vec<f32>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (0..n)
                    .map(|j| {
                        if i == j {
                            return 1.0;
                        }
                        let text = text_vectors[i].dot(&text_vectors[j]);
                        let numeric = cosine(&numeric_rows[i], &numeric_rows[j]);
                        TEXT_WEIGHT * text + NUMERIC_WEIGHT * numeric
                    })
                    .collect()
            })
            .collect();

        let arena = IdArena::from_ids(eligible.iter().map(|m| m.id).collect());
        debug!(
            movies = n,
            vocabulary = vectorizer.vocabulary_size(),
            "built content similarity matrix"
        );

        Ok(Self { arena, rows })
    }

    /// Similarity between two indexed movies, if both are in the matrix
    pub fn similarity(&self, a: MovieId, b: MovieId) -> Option<f32> {
        let i = self.arena.index_of(a)?;
        let j = self.arena.index_of(b)?;
        Some(self.rows[i][j])
    }

    /// Whether a movie participates in the matrix
    pub fn contains(&self, movie_id: MovieId) -> bool {
        self.arena.contains(movie_id)
    }

    /// Number of indexed movies
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Nearest neighbors of a movie by blended similarity.
    ///
    /// Skips the movie itself and everything in `exclude`. Fails with
    /// `NotIndexed` when the movie is not in the matrix.
    pub fn similar_to(
        &self,
        movie_id: MovieId,
        limit: usize,
        exclude: &HashSet<MovieId>,
    ) -> Result<Vec<Recommendation>> {
        let row_index = self
            .arena
            .index_of(movie_id)
            .ok_or(ScoreError::NotIndexed { movie_id })?;

        let neighbors = self.rows[row_index]
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != row_index)
            .filter_map(|(j, &similarity)| {
                let id = self.arena.id_at(j)?;
                (!exclude.contains(&id))
                    .then(|| Recommendation::new(id, ScoreSource::Content, similarity))
            })
            .collect();

        Ok(rank(neighbors, limit))
    }
}

/// Standard-scale the numeric feature block so no single feature dominates
/// the cosine. Zero-variance columns collapse to zero.
fn scale_numeric_features(movies: &[&Movie]) -> Vec<Vec<f32>> {
    let raw: Vec<[f32; 4]> = movies
        .iter()
        .map(|m| {
            [
                m.vote_average,
                m.popularity,
                m.runtime.unwrap_or(0) as f32,
                m.release_year.unwrap_or(0) as f32,
            ]
        })
        .collect();

    let n = raw.len() as f32;
    let mut means = [0.0f32; 4];
    for row in &raw {
        for (mean, value) in means.iter_mut().zip(row) {
            *mean += value / n;
        }
    }
    let mut stds = [0.0f32; 4];
    for row in &raw {
        for ((std, value), mean) in stds.iter_mut().zip(row).zip(&means) {
            *std += (value - mean).powi(2) / n;
        }
    }
    for std in &mut stds {
        *std = std.sqrt();
    }

    raw.into_iter()
        .map(|row| {
            row.iter()
                .zip(&means)
                .zip(&stds)
                .map(|((value, mean), std)| {
                    if *std > 0.0 { (value - mean) / std } else { 0.0 }
                })
                .collect()
        })
        .collect()
}

/// Content-based scorer over a built model and its source snapshot
pub struct ContentScorer {
    snapshot: Arc<CatalogSnapshot>,
    model: ContentModel,
}

impl ContentScorer {
    pub fn new(snapshot: Arc<CatalogSnapshot>, model: ContentModel) -> Self {
        Self { snapshot, model }
    }

    pub fn model(&self) -> &ContentModel {
        &self.model
    }

    /// Movies most similar to the given one, excluding the movie itself
    /// and anything in `exclude`
    pub fn similar_movies(
        &self,
        movie_id: MovieId,
        limit: usize,
        exclude: &HashSet<MovieId>,
    ) -> Result<Vec<Recommendation>> {
        self.model.similar_to(movie_id, limit, exclude)
    }

    /// The user's anchors: movies they rated at or above the anchor mark,
    /// strongest first
    fn anchors(&self, user_id: UserId) -> Vec<(MovieId, f32)> {
        let mut anchors: Vec<(MovieId, f32)> = self
            .snapshot
            .ratings_for_user(user_id)
            .iter()
            .filter(|r| r.rating >= ANCHOR_RATING)
            .map(|r| (r.movie_id, r.rating))
            .collect();
        anchors.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        anchors
    }

    /// Keyword themes present in both movies' descriptions
    fn shared_themes(&self, a: &Movie, b: &Movie) -> Vec<&'static str> {
        let text_a = a.description_text();
        let text_b = b.description_text();
        THEMES
            .iter()
            .filter(|(_, keywords)| {
                keywords.iter().any(|k| text_a.contains(k))
                    && keywords.iter().any(|k| text_b.contains(k))
            })
            .map(|(theme, _)| *theme)
            .collect()
    }
}

impl Scorer for ContentScorer {
    fn name(&self) -> &'static str {
        "content"
    }

    /// ## Algorithm
    /// 1. Anchors = the user's ratings >= 4.0 (popularity fallback if none).
    /// 2. Per anchor, pull 20 nearest neighbors the user hasn't rated.
    /// 3. Accumulate `similarity * rating / 5.0` per candidate, then rank by
    ///    the **average** contribution so one prolific anchor cannot drown
    ///    out a strong single match.
    #[instrument(skip(self), fields(scorer = self.name()))]
    fn recommend(&self, user_id: UserId, limit: usize) -> Result<Vec<Recommendation>> {
        let rated = self.snapshot.rated_movie_ids(user_id);
        let anchors = self.anchors(user_id);
        if anchors.is_empty() {
            debug!(user_id, "no anchors, falling back to popularity");
            return Ok(popularity_fallback(&self.snapshot, &rated, limit));
        }

        let mut sums: HashMap<MovieId, (f32, u32)> = HashMap::new();
        for (anchor_id, rating) in &anchors {
            let Ok(neighbors) = self
                .model
                .similar_to(*anchor_id, NEIGHBORS_PER_ANCHOR, &rated)
            else {
                // Anchor not indexed (too obscure for the matrix); skip it.
                continue;
            };
            for neighbor in neighbors {
                let entry = sums.entry(neighbor.movie_id).or_insert((0.0, 0));
                entry.0 += neighbor.score * rating / 5.0;
                entry.1 += 1;
            }
        }

        if sums.is_empty() {
            return Ok(popularity_fallback(&self.snapshot, &rated, limit));
        }

        let candidates = sums
            .into_iter()
            .map(|(movie_id, (sum, count))| {
                Recommendation::new(movie_id, ScoreSource::Content, sum / count as f32)
            })
            .collect();
        Ok(rank(candidates, limit))
    }

    /// Pick the best anchor among the user's top-3 loved movies and report
    /// what the target shares with it.
    fn explain(&self, user_id: UserId, movie_id: MovieId) -> Option<Explanation> {
        let target = self.snapshot.movie(movie_id)?;

        let best = self
            .anchors(user_id)
            .into_iter()
            .take(3)
            .filter_map(|(anchor_id, rating)| {
                let similarity = self.model.similarity(anchor_id, movie_id)?;
                Some((anchor_id, rating, similarity))
            })
            .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal))?;

        let (anchor_id, anchor_rating, similarity) = best;
        let anchor = self.snapshot.movie(anchor_id)?;

        let shared_genres: Vec<Genre> = target
            .genres
            .iter()
            .filter(|g| anchor.genres.contains(g))
            .copied()
            .collect();
        let shared_themes = self.shared_themes(anchor, target);

        Some(Explanation::Content {
            reason: format!(
                "Because you rated {} {:.1} stars",
                anchor.title, anchor_rating
            ),
            anchor_title: anchor.title.clone(),
            anchor_rating,
            similarity,
            shared_genres,
            shared_themes,
        })
    }
}
