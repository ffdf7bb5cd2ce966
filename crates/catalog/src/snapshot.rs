//! The CatalogSnapshot: a read-only, point-in-time view of catalog data.
//!
//! A snapshot is assembled once (by whatever loads ratings, movies, reviews,
//! friendships, and trending lists out of the external store), indexed, and
//! then shared behind an `Arc` for the lifetime of a scoring session. Scorers
//! never write to it; a rebuild produces a fresh snapshot instead of patching
//! this one, so matrix construction never races catalog updates.

use crate::error::{CatalogError, Result};
use crate::types::*;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Minimum vote count for a movie to participate in popularity fallbacks.
const POPULAR_MIN_VOTES: u32 = 100;

/// Read-only accessor over ratings, movies, reviews, friendships, and
/// trending lists.
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    // Primary data stores
    movies: HashMap<MovieId, Movie>,

    // Rating indices for fast lookups
    /// All ratings made by each user
    user_ratings: HashMap<UserId, Vec<Rating>>,
    /// All ratings received by each movie
    movie_ratings: HashMap<MovieId, Vec<Rating>>,

    /// Movies grouped by genre (one movie can appear in multiple genre lists)
    genre_index: HashMap<Genre, Vec<MovieId>>,

    /// Approved review bodies per movie
    reviews: HashMap<MovieId, Vec<String>>,

    /// Accepted-friendship adjacency (stored in both directions)
    friendships: HashMap<UserId, Vec<UserId>>,

    trending_day: Vec<MovieId>,
    trending_week: Vec<MovieId>,
}

impl CatalogSnapshot {
    /// Creates a new, empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    // Getters return references; the snapshot owns the data.

    /// Get a movie by id
    pub fn movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    /// Iterate over every movie in the snapshot
    pub fn all_movies(&self) -> impl Iterator<Item = &Movie> {
        self.movies.values()
    }

    /// Get all ratings made by a user (empty slice if none)
    pub fn ratings_for_user(&self, user_id: UserId) -> &[Rating] {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all ratings for a movie
    pub fn ratings_for_movie(&self, movie_id: MovieId) -> &[Rating] {
        self.movie_ratings
            .get(&movie_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Iterate over every rating in the snapshot
    pub fn all_ratings(&self) -> impl Iterator<Item = &Rating> {
        self.user_ratings.values().flatten()
    }

    /// How many ratings a user has made
    pub fn rating_count(&self, user_id: UserId) -> usize {
        self.user_ratings.get(&user_id).map_or(0, |v| v.len())
    }

    /// The set of movie ids a user has rated
    pub fn rated_movie_ids(&self, user_id: UserId) -> HashSet<MovieId> {
        self.ratings_for_user(user_id)
            .iter()
            .map(|r| r.movie_id)
            .collect()
    }

    /// All movies carrying a specific genre
    pub fn movies_in_genre(&self, genre: Genre) -> &[MovieId] {
        self.genre_index
            .get(&genre)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Up to `limit` approved review bodies for a movie
    pub fn reviews_for_movie(&self, movie_id: MovieId, limit: usize) -> &[String] {
        let reviews = self
            .reviews
            .get(&movie_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        &reviews[..limit.min(reviews.len())]
    }

    /// Accepted friends of a user
    pub fn accepted_friend_ids(&self, user_id: UserId) -> &[UserId] {
        self.friendships
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Trending movie ids for the given window
    pub fn trending_movie_ids(&self, period: TrendingPeriod) -> &[MovieId] {
        match period {
            TrendingPeriod::Day => &self.trending_day,
            TrendingPeriod::Week => &self.trending_week,
        }
    }

    /// Globally popular movies: vote_count >= 100, ranked by catalog
    /// popularity descending. This is the fallback ranking every scorer
    /// degrades to when it lacks the data to do better.
    pub fn popular_movies(&self, limit: usize) -> Vec<MovieId> {
        let mut popular: Vec<&Movie> = self
            .movies
            .values()
            .filter(|m| m.vote_count >= POPULAR_MIN_VOTES)
            .collect();

        popular.sort_by(|a, b| {
            b.popularity
                .partial_cmp(&a.popularity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        popular.truncate(limit);
        popular.into_iter().map(|m| m.id).collect()
    }

    // Mutators, used while assembling the snapshot. Once shared, the
    // snapshot is only read.

    /// Insert a movie
    pub fn insert_movie(&mut self, movie: Movie) {
        self.movies.insert(movie.id, movie);
    }

    /// Insert a rating and update both rating indices
    pub fn insert_rating(&mut self, rating: Rating) {
        self.user_ratings
            .entry(rating.user_id)
            .or_default()
            .push(rating);
        self.movie_ratings
            .entry(rating.movie_id)
            .or_default()
            .push(rating);
    }

    /// Insert an approved review body for a movie
    pub fn insert_review(&mut self, movie_id: MovieId, body: impl Into<String>) {
        self.reviews.entry(movie_id).or_default().push(body.into());
    }

    /// Record an accepted friendship (stored in both directions)
    pub fn insert_friendship(&mut self, user_id: UserId, friend_id: UserId) {
        self.friendships.entry(user_id).or_default().push(friend_id);
        self.friendships.entry(friend_id).or_default().push(user_id);
    }

    /// Replace the trending list for a window
    pub fn set_trending(&mut self, period: TrendingPeriod, movie_ids: Vec<MovieId>) {
        match period {
            TrendingPeriod::Day => self.trending_day = movie_ids,
            TrendingPeriod::Week => self.trending_week = movie_ids,
        }
    }

    /// Build the genre index after all movies are inserted.
    ///
    /// Must be called before `movies_in_genre` returns anything useful.
    pub fn build_genre_index(&mut self) {
        self.genre_index.clear();
        for (movie_id, movie) in &self.movies {
            for &genre in &movie.genres {
                self.genre_index.entry(genre).or_default().push(*movie_id);
            }
        }
        // Deterministic order within each genre bucket
        for ids in self.genre_index.values_mut() {
            ids.sort_unstable();
        }
        debug!(genres = self.genre_index.len(), "built genre index");
    }

    /// Get counts for debugging/validation: (movies, users, ratings)
    pub fn counts(&self) -> (usize, usize, usize) {
        let total_ratings = self.user_ratings.values().map(|v| v.len()).sum();
        (self.movies.len(), self.user_ratings.len(), total_ratings)
    }

    /// Validate referential integrity and rating ranges.
    ///
    /// Checks that every rating points at a movie in the snapshot and that
    /// rating values fall on the 0.5..=5.0 half-star scale.
    pub fn validate(&self) -> Result<()> {
        for ratings in self.user_ratings.values() {
            for rating in ratings {
                if !self.movies.contains_key(&rating.movie_id) {
                    return Err(CatalogError::MissingReference {
                        entity: "Movie",
                        id: rating.movie_id,
                    });
                }
                let value = rating.rating;
                let on_half_step = (value * 2.0).fract().abs() < f32::EPSILON;
                if !(0.5..=5.0).contains(&value) || !on_half_step {
                    return Err(CatalogError::InvalidValue {
                        field: "rating",
                        value: value.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: MovieId, genres: Vec<Genre>, vote_count: u32, popularity: f32) -> Movie {
        Movie {
            id,
            title: format!("Movie {}", id),
            overview: Some("An overview".to_string()),
            tagline: None,
            genres,
            vote_average: 7.0,
            vote_count,
            popularity,
            runtime: Some(100),
            release_year: Some(2010),
        }
    }

    #[test]
    fn test_rating_indices() {
        let mut snapshot = CatalogSnapshot::new();
        snapshot.insert_movie(movie(1, vec![Genre::Action], 100, 5.0));
        snapshot.insert_rating(Rating {
            user_id: 1,
            movie_id: 1,
            rating: 4.5,
            timestamp: 1_000_000,
        });

        assert_eq!(snapshot.ratings_for_user(1).len(), 1);
        assert_eq!(snapshot.ratings_for_movie(1).len(), 1);
        assert_eq!(snapshot.rating_count(1), 1);
        assert!(snapshot.rated_movie_ids(1).contains(&1));
        assert_eq!(snapshot.counts(), (1, 1, 1));
    }

    #[test]
    fn test_genre_index() {
        let mut snapshot = CatalogSnapshot::new();
        snapshot.insert_movie(movie(1, vec![Genre::Action, Genre::Drama], 100, 5.0));
        snapshot.insert_movie(movie(2, vec![Genre::Drama], 100, 5.0));
        snapshot.build_genre_index();

        assert_eq!(snapshot.movies_in_genre(Genre::Drama), &[1, 2]);
        assert_eq!(snapshot.movies_in_genre(Genre::Action), &[1]);
        assert!(snapshot.movies_in_genre(Genre::Horror).is_empty());
    }

    #[test]
    fn test_popular_movies_ranked_by_popularity() {
        let mut snapshot = CatalogSnapshot::new();
        snapshot.insert_movie(movie(1, vec![Genre::Action], 200, 10.0));
        snapshot.insert_movie(movie(2, vec![Genre::Action], 200, 50.0));
        // Too few votes to qualify
        snapshot.insert_movie(movie(3, vec![Genre::Action], 10, 90.0));

        assert_eq!(snapshot.popular_movies(10), vec![2, 1]);
    }

    #[test]
    fn test_reviews_limit() {
        let mut snapshot = CatalogSnapshot::new();
        for i in 0..15 {
            snapshot.insert_review(1, format!("review {}", i));
        }
        assert_eq!(snapshot.reviews_for_movie(1, 10).len(), 10);
        assert_eq!(snapshot.reviews_for_movie(2, 10).len(), 0);
    }

    #[test]
    fn test_friendship_is_bidirectional() {
        let mut snapshot = CatalogSnapshot::new();
        snapshot.insert_friendship(1, 2);

        assert_eq!(snapshot.accepted_friend_ids(1), &[2]);
        assert_eq!(snapshot.accepted_friend_ids(2), &[1]);
    }

    #[test]
    fn test_validate_rejects_out_of_range_rating() {
        let mut snapshot = CatalogSnapshot::new();
        snapshot.insert_movie(movie(1, vec![Genre::Action], 100, 5.0));
        snapshot.insert_rating(Rating {
            user_id: 1,
            movie_id: 1,
            rating: 5.5,
            timestamp: 0,
        });

        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_movie() {
        let mut snapshot = CatalogSnapshot::new();
        snapshot.insert_rating(Rating {
            user_id: 1,
            movie_id: 99,
            rating: 4.0,
            timestamp: 0,
        });

        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_half_steps() {
        let mut snapshot = CatalogSnapshot::new();
        snapshot.insert_movie(movie(1, vec![Genre::Action], 100, 5.0));
        for (user, value) in [(1, 0.5), (2, 3.5), (3, 5.0)] {
            snapshot.insert_rating(Rating {
                user_id: user,
                movie_id: 1,
                rating: value,
                timestamp: 0,
            });
        }

        assert!(snapshot.validate().is_ok());
    }
}
