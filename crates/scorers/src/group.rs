//! Group consensus scorer for watch parties.
//!
//! ## Algorithm
//! 1. Per member, compute genre preferences: average rating per genre over
//!    genres with at least 2 ratings.
//! 2. Common genres: liked (average >= 3.5) by at least floor(n/2) + 1
//!    members. At n = 2 that means unanimity.
//! 3. Candidates: common-genre movies with vote_count >= 50 by popularity
//!    descending, capped at 200; popular movies when no genre is common.
//!    Anything any member has rated is excluded.
//! 4. Individual satisfaction from genre preferences plus a quality
//!    boost/penalty; group satisfaction = 0.6 * mean + 0.4 * min so nobody
//!    is left completely unsatisfied. Keep movies at or above the floor.

use crate::error::{Result, ScoreError};
use crate::types::{Explanation, Recommendation, ScoreSource, rank};
use catalog::{CatalogSnapshot, Genre, Movie, MovieId, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default satisfaction floor for keeping a candidate
pub const DEFAULT_MIN_SATISFACTION: f32 = 0.6;

/// Genre averages at or above this count as "liked"
const LIKED_GENRE_AVERAGE: f32 = 3.5;

/// Ratings needed in a genre before it counts as a preference
const MIN_GENRE_RATINGS: usize = 2;

/// Vote-count floor for common-genre candidates
const CANDIDATE_MIN_VOTES: u32 = 50;

/// Candidate pool cap before satisfaction scoring
const CANDIDATE_LIMIT: usize = 200;

/// Group consensus scorer; stateless apart from the snapshot
pub struct GroupScorer {
    snapshot: Arc<CatalogSnapshot>,
}

impl GroupScorer {
    pub fn new(snapshot: Arc<CatalogSnapshot>) -> Self {
        Self { snapshot }
    }

    /// Recommendations that balance the whole group's tastes.
    ///
    /// Requires at least 2 distinct users. Movies below `min_satisfaction`
    /// are dropped; an empty result is valid (a picky group may have no
    /// consensus at the floor).
    #[instrument(skip(self, user_ids), fields(group_size = user_ids.len()))]
    pub fn recommend_for_group(
        &self,
        user_ids: &[UserId],
        limit: usize,
        min_satisfaction: f32,
    ) -> Result<Vec<Recommendation>> {
        let mut members: Vec<UserId> = user_ids.to_vec();
        members.sort_unstable();
        members.dedup();
        if members.len() < 2 {
            return Err(ScoreError::InvalidGroupSize(members.len()));
        }

        let preferences: HashMap<UserId, HashMap<Genre, f32>> = members
            .iter()
            .map(|&u| (u, self.genre_preferences(u)))
            .collect();

        let mut rated_by_any: HashSet<MovieId> = HashSet::new();
        for &member in &members {
            rated_by_any.extend(self.snapshot.rated_movie_ids(member));
        }

        let common_genres = self.common_genres(&members, &preferences);
        let candidates = self.candidates(&common_genres, &rated_by_any);
        debug!(
            common_genres = common_genres.len(),
            candidates = candidates.len(),
            "scoring group candidates"
        );

        let scored: Vec<Recommendation> = candidates
            .into_iter()
            .filter_map(|movie| {
                let satisfaction = self.group_satisfaction(movie, &members, &preferences);
                (satisfaction >= min_satisfaction).then(|| {
                    Recommendation::new(movie.id, ScoreSource::Group, satisfaction)
                })
            })
            .collect();

        Ok(rank(scored, limit))
    }

    /// A user's average rating per genre, over genres with >= 2 ratings
    fn genre_preferences(&self, user_id: UserId) -> HashMap<Genre, f32> {
        let mut sums: HashMap<Genre, (f32, usize)> = HashMap::new();
        for rating in self.snapshot.ratings_for_user(user_id) {
            let Some(movie) = self.snapshot.movie(rating.movie_id) else {
                continue;
            };
            for &genre in &movie.genres {
                let entry = sums.entry(genre).or_insert((0.0, 0));
                entry.0 += rating.rating;
                entry.1 += 1;
            }
        }
        sums.into_iter()
            .filter(|(_, (_, count))| *count >= MIN_GENRE_RATINGS)
            .map(|(genre, (sum, count))| (genre, sum / count as f32))
            .collect()
    }

    /// Genres liked by at least floor(n/2) + 1 members
    fn common_genres(
        &self,
        members: &[UserId],
        preferences: &HashMap<UserId, HashMap<Genre, f32>>,
    ) -> HashSet<Genre> {
        let mut support: HashMap<Genre, usize> = HashMap::new();
        for member in members {
            if let Some(prefs) = preferences.get(member) {
                for (&genre, &average) in prefs {
                    if average >= LIKED_GENRE_AVERAGE {
                        *support.entry(genre).or_insert(0) += 1;
                    }
                }
            }
        }

        let min_support = members.len() / 2 + 1;
        support
            .into_iter()
            .filter(|(_, count)| *count >= min_support)
            .map(|(genre, _)| genre)
            .collect()
    }

    /// Candidate pool: common-genre movies by popularity, or the plain
    /// popular list when the group shares no genre.
    fn candidates(&self, common_genres: &HashSet<Genre>, exclude: &HashSet<MovieId>) -> Vec<&Movie> {
        let mut pool: Vec<&Movie> = if common_genres.is_empty() {
            self.snapshot
                .popular_movies(CANDIDATE_LIMIT + exclude.len())
                .into_iter()
                .filter_map(|id| self.snapshot.movie(id))
                .collect()
        } else {
            let mut ids: HashSet<MovieId> = HashSet::new();
            for &genre in common_genres {
                ids.extend(self.snapshot.movies_in_genre(genre));
            }
            ids.into_iter()
                .filter_map(|id| self.snapshot.movie(id))
                .filter(|m| m.vote_count >= CANDIDATE_MIN_VOTES)
                .collect()
        };

        pool.retain(|m| !exclude.contains(&m.id));
        pool.sort_by(|a, b| {
            b.popularity
                .partial_cmp(&a.popularity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        pool.truncate(CANDIDATE_LIMIT);
        pool
    }

    /// 0.6 * mean + 0.4 * min over the members' individual satisfactions
    fn group_satisfaction(
        &self,
        movie: &Movie,
        members: &[UserId],
        preferences: &HashMap<UserId, HashMap<Genre, f32>>,
    ) -> f32 {
        let satisfactions: Vec<f32> = members
            .iter()
            .map(|member| self.user_satisfaction(movie, member, preferences))
            .collect();

        let mean = satisfactions.iter().sum::<f32>() / satisfactions.len() as f32;
        let min = satisfactions.iter().copied().fold(f32::INFINITY, f32::min);

        (0.6 * mean + 0.4 * min).clamp(0.0, 1.0)
    }

    /// Predicted satisfaction for one member, in [0, 1].
    ///
    /// Members without rating history use the movie's vote average as a
    /// proxy; members with history but no genre preferences sit at neutral.
    fn user_satisfaction(
        &self,
        movie: &Movie,
        member: &UserId,
        preferences: &HashMap<UserId, HashMap<Genre, f32>>,
    ) -> f32 {
        if self.snapshot.ratings_for_user(*member).is_empty() {
            return movie.vote_average / 10.0;
        }
        let Some(prefs) = preferences.get(member).filter(|p| !p.is_empty()) else {
            return 0.5;
        };

        let mut genre_satisfaction = 0.0f32;
        let mut matched = 0usize;
        for genre in &movie.genres {
            if let Some(&average) = prefs.get(genre) {
                genre_satisfaction += ((average - 1.0) / 4.0).max(0.0);
                matched += 1;
            }
        }
        if matched > 0 {
            genre_satisfaction /= matched as f32;
        }

        let quality_boost = if movie.vote_average >= 7.0 { 0.1 } else { 0.0 };
        let quality_penalty = if movie.vote_average < 5.0 { 0.2 } else { 0.0 };

        (genre_satisfaction + quality_boost - quality_penalty).clamp(0.0, 1.0)
    }

    /// Generic consensus explanation for a movie
    pub fn explain(&self, movie_id: MovieId) -> Option<Explanation> {
        let movie = self.snapshot.movie(movie_id)?;
        Some(Explanation::Group {
            reason: "This movie balances everyone's preferences".to_string(),
            shared_genres: movie.genres.clone(),
            quality_rating: movie.vote_average,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::Rating;

    fn movie(id: MovieId, genres: Vec<Genre>, vote_average: f32, popularity: f32) -> Movie {
        Movie {
            id,
            title: format!("Movie {}", id),
            overview: Some("An overview".to_string()),
            tagline: None,
            genres,
            vote_average,
            vote_count: 150,
            popularity,
            runtime: Some(100),
            release_year: Some(2016),
        }
    }

    fn rating(user_id: UserId, movie_id: MovieId, value: f32) -> Rating {
        Rating {
            user_id,
            movie_id,
            rating: value,
            timestamp: 0,
        }
    }

    /// Users 1 and 2 both love Action (two 4.5+ ratings each); user 2 also
    /// loves Comedy but alone. Movies 10/11 seed user 1, 12/13 seed user 2,
    /// 20..22 are unseen Action candidates, 30 is an unseen Comedy.
    fn create_test_snapshot() -> Arc<CatalogSnapshot> {
        let mut snapshot = CatalogSnapshot::new();
        snapshot.insert_movie(movie(10, vec![Genre::Action], 7.5, 10.0));
        snapshot.insert_movie(movie(11, vec![Genre::Action], 7.5, 10.0));
        snapshot.insert_movie(movie(12, vec![Genre::Action, Genre::Comedy], 7.5, 10.0));
        snapshot.insert_movie(movie(13, vec![Genre::Action, Genre::Comedy], 7.5, 10.0));
        for id in 20..23 {
            snapshot.insert_movie(movie(id, vec![Genre::Action], 7.5, 40.0 + id as f32));
        }
        snapshot.insert_movie(movie(30, vec![Genre::Comedy], 7.5, 99.0));

        snapshot.insert_rating(rating(1, 10, 4.5));
        snapshot.insert_rating(rating(1, 11, 5.0));
        snapshot.insert_rating(rating(2, 12, 4.5));
        snapshot.insert_rating(rating(2, 13, 4.5));
        snapshot.build_genre_index();
        Arc::new(snapshot)
    }

    #[test]
    fn test_rejects_groups_smaller_than_two() {
        let scorer = GroupScorer::new(create_test_snapshot());

        let err = scorer
            .recommend_for_group(&[1], 10, DEFAULT_MIN_SATISFACTION)
            .unwrap_err();
        assert!(matches!(err, ScoreError::InvalidGroupSize(1)));

        // Duplicates of one user are still a group of one
        let err = scorer
            .recommend_for_group(&[1, 1, 1], 10, DEFAULT_MIN_SATISFACTION)
            .unwrap_err();
        assert!(matches!(err, ScoreError::InvalidGroupSize(1)));
    }

    #[test]
    fn test_recommends_from_the_common_genre() {
        let scorer = GroupScorer::new(create_test_snapshot());

        let recs = scorer
            .recommend_for_group(&[1, 2], 10, DEFAULT_MIN_SATISFACTION)
            .unwrap();
        assert!(!recs.is_empty());
        // Only unseen Action movies qualify; the solo Comedy pick does not
        assert!(recs.iter().all(|r| (20..23).contains(&r.movie_id)));
        // Nothing anyone in the group has already rated
        assert!(recs.iter().all(|r| ![10, 11, 12, 13].contains(&r.movie_id)));
    }

    #[test]
    fn test_satisfaction_floor_filters_weak_candidates() {
        let scorer = GroupScorer::new(create_test_snapshot());

        let all = scorer.recommend_for_group(&[1, 2], 10, 0.0).unwrap();
        let strict = scorer.recommend_for_group(&[1, 2], 10, 0.99).unwrap();
        assert!(strict.len() <= all.len());
        assert!(all.iter().all(|r| r.score <= 1.0 && r.score >= 0.0));
    }

    #[test]
    fn test_three_member_majority_is_two() {
        // Users 1 and 2 love Action; user 3 loves only Romance. With n = 3
        // the support threshold is 3/2 + 1 = 2, so Action is common.
        let mut snapshot = CatalogSnapshot::new();
        snapshot.insert_movie(movie(10, vec![Genre::Action], 7.5, 10.0));
        snapshot.insert_movie(movie(11, vec![Genre::Action], 7.5, 10.0));
        snapshot.insert_movie(movie(12, vec![Genre::Romance], 7.5, 10.0));
        snapshot.insert_movie(movie(13, vec![Genre::Romance], 7.5, 10.0));
        snapshot.insert_movie(movie(20, vec![Genre::Action], 7.5, 50.0));

        for (user, movie_id) in [(1, 10), (1, 11), (2, 10), (2, 11), (3, 12), (3, 13)] {
            snapshot.insert_rating(rating(user, movie_id, 4.5));
        }
        snapshot.build_genre_index();
        let scorer = GroupScorer::new(Arc::new(snapshot));

        let recs = scorer.recommend_for_group(&[1, 2, 3], 10, 0.0).unwrap();
        let ids: Vec<_> = recs.iter().map(|r| r.movie_id).collect();
        assert_eq!(ids, vec![20]);
    }

    #[test]
    fn test_no_common_genre_falls_back_to_popular() {
        // Two users with opposite tastes share nothing at n = 2 (unanimity)
        let mut snapshot = CatalogSnapshot::new();
        snapshot.insert_movie(movie(10, vec![Genre::Action], 7.5, 10.0));
        snapshot.insert_movie(movie(11, vec![Genre::Action], 7.5, 10.0));
        snapshot.insert_movie(movie(12, vec![Genre::Romance], 7.5, 10.0));
        snapshot.insert_movie(movie(13, vec![Genre::Romance], 7.5, 10.0));
        snapshot.insert_movie(movie(20, vec![Genre::Drama], 7.5, 80.0));

        for (user, movie_id) in [(1, 10), (1, 11), (2, 12), (2, 13)] {
            snapshot.insert_rating(rating(user, movie_id, 4.5));
        }
        snapshot.build_genre_index();
        let scorer = GroupScorer::new(Arc::new(snapshot));

        // With the floor at 0 the popular fallback surfaces the Drama
        let recs = scorer.recommend_for_group(&[1, 2], 10, 0.0).unwrap();
        assert!(recs.iter().any(|r| r.movie_id == 20));
    }

    #[test]
    fn test_explain_reports_consensus_factors() {
        let scorer = GroupScorer::new(create_test_snapshot());

        let explanation = scorer.explain(20).unwrap();
        match explanation {
            Explanation::Group {
                shared_genres,
                quality_rating,
                ..
            } => {
                assert_eq!(shared_genres, vec![Genre::Action]);
                assert!((quality_rating - 7.5).abs() < 1e-6);
            }
            other => panic!("expected group explanation, got {:?}", other),
        }
        assert!(scorer.explain(999).is_none());
    }

    #[test]
    fn test_member_without_history_uses_vote_average() {
        let snapshot = create_test_snapshot();
        let scorer = GroupScorer::new(Arc::clone(&snapshot));

        let movie = snapshot.movie(20).unwrap();
        let preferences = HashMap::new();
        let satisfaction = scorer.user_satisfaction(movie, &99, &preferences);
        assert!((satisfaction - 0.75).abs() < 1e-6);
    }
}
