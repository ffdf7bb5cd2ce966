//! Mood-based scorer: "what fits how you feel right now".
//!
//! Moods form a closed vocabulary; each maps to a static genre profile and a
//! keyword profile. A movie's mood fit blends genre overlap, description
//! keywords, review sentiment compatibility, catalog quality, and a damped
//! popularity term. When no mood is supplied, the user's recent rating
//! activity is mined for the best-fitting one.

use crate::error::{Result, ScoreError};
use crate::text::sentiment_polarity;
use crate::types::{Explanation, Recommendation, ScoreSource, Scorer};
use catalog::{CatalogSnapshot, Genre, Movie, MovieId, UserId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Minimum catalog vote count for a movie to be a mood candidate
const MIN_VOTE_COUNT: u32 = 20;

/// Reviews sampled per movie for sentiment compatibility
const MAX_REVIEWS: usize = 10;

/// Window consulted when inferring a mood from recent activity
const RECENT_WINDOW_SECS: i64 = 7 * 24 * 60 * 60;

/// The closed mood vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Excited,
    Romantic,
    Adventurous,
    Relaxed,
    Thoughtful,
    Scared,
    Nostalgic,
    Energetic,
}

impl Mood {
    pub const ALL: [Mood; 10] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Excited,
        Mood::Romantic,
        Mood::Adventurous,
        Mood::Relaxed,
        Mood::Thoughtful,
        Mood::Scared,
        Mood::Nostalgic,
        Mood::Energetic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Excited => "excited",
            Mood::Romantic => "romantic",
            Mood::Adventurous => "adventurous",
            Mood::Relaxed => "relaxed",
            Mood::Thoughtful => "thoughtful",
            Mood::Scared => "scared",
            Mood::Nostalgic => "nostalgic",
            Mood::Energetic => "energetic",
        }
    }

    /// Genres that fit this mood
    pub fn target_genres(&self) -> &'static [Genre] {
        match self {
            Mood::Happy => &[
                Genre::Comedy,
                Genre::Family,
                Genre::Animation,
                Genre::Music,
                Genre::Romance,
            ],
            Mood::Sad => &[Genre::Drama, Genre::Romance],
            Mood::Excited => &[
                Genre::Action,
                Genre::Adventure,
                Genre::Thriller,
                Genre::ScienceFiction,
            ],
            Mood::Romantic => &[Genre::Romance, Genre::Drama],
            Mood::Adventurous => &[
                Genre::Adventure,
                Genre::Action,
                Genre::Fantasy,
                Genre::ScienceFiction,
            ],
            Mood::Relaxed => &[Genre::Comedy, Genre::Family, Genre::Documentary],
            Mood::Thoughtful => &[
                Genre::Drama,
                Genre::Documentary,
                Genre::Mystery,
                Genre::ScienceFiction,
            ],
            Mood::Scared => &[Genre::Horror, Genre::Thriller],
            Mood::Nostalgic => &[Genre::Drama, Genre::Family],
            Mood::Energetic => &[Genre::Action, Genre::Adventure, Genre::Comedy],
        }
    }

    /// Description keywords that signal this mood
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Mood::Happy => &[
                "joy",
                "happiness",
                "cheerful",
                "uplifting",
                "positive",
                "fun",
                "lighthearted",
            ],
            Mood::Sad => &[
                "emotional",
                "touching",
                "tearjerker",
                "melancholy",
                "tragic",
                "heartbreaking",
            ],
            Mood::Excited => &[
                "thrilling",
                "intense",
                "adrenaline",
                "fast-paced",
                "explosive",
                "action-packed",
            ],
            Mood::Romantic => &["love story", "romantic", "passion", "relationship", "intimate"],
            Mood::Adventurous => &["journey", "quest", "exploration", "epic", "adventure"],
            Mood::Relaxed => &["calm", "peaceful", "gentle", "easy-going", "comfort"],
            Mood::Thoughtful => &[
                "philosophical",
                "deep",
                "complex",
                "intellectual",
                "thought-provoking",
            ],
            Mood::Scared => &["scary", "frightening", "terrifying", "suspenseful", "creepy"],
            Mood::Nostalgic => &["classic", "vintage", "memories", "past", "childhood"],
            Mood::Energetic => &["dynamic", "vibrant", "energetic", "lively", "spirited"],
        }
    }

    /// How a review's polarity contributes to this mood's fit.
    ///
    /// Upbeat moods only reward positive reviews; sad/thoughtful moods
    /// reward emotional intensity in either direction; scared only rewards
    /// negative reviews; everything else gets half-weighted intensity.
    fn sentiment_compatibility(&self, polarity: f32) -> f32 {
        match self {
            Mood::Happy | Mood::Excited | Mood::Energetic => polarity.max(0.0),
            Mood::Sad | Mood::Thoughtful => polarity.abs(),
            Mood::Scared => (-polarity).max(0.0),
            _ => polarity.abs() * 0.5,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mood {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "happy" => Ok(Mood::Happy),
            "sad" => Ok(Mood::Sad),
            "excited" => Ok(Mood::Excited),
            "romantic" => Ok(Mood::Romantic),
            "adventurous" => Ok(Mood::Adventurous),
            "relaxed" => Ok(Mood::Relaxed),
            "thoughtful" => Ok(Mood::Thoughtful),
            "scared" => Ok(Mood::Scared),
            "nostalgic" => Ok(Mood::Nostalgic),
            "energetic" => Ok(Mood::Energetic),
            other => Err(ScoreError::InvalidMood(other.to_string())),
        }
    }
}

/// Mood scorer over a catalog snapshot. Stateless apart from the snapshot;
/// there is no model to train. Inference reads an injected clock so it
/// stays deterministic under test.
pub struct MoodScorer {
    snapshot: Arc<CatalogSnapshot>,
    clock: fn() -> i64,
}

impl MoodScorer {
    pub fn new(snapshot: Arc<CatalogSnapshot>) -> Self {
        Self {
            snapshot,
            clock: unix_time,
        }
    }

    /// A scorer that reads the given clock instead of the system time
    pub fn with_clock(snapshot: Arc<CatalogSnapshot>, clock: fn() -> i64) -> Self {
        Self { snapshot, clock }
    }

    /// How well a movie fits a mood.
    ///
    /// `0.3 * genre matches + 0.2 * keyword hits + 0.3 * sentiment fit +
    /// 0.1 * vote_average/10 + min(ln(popularity + 1)/10, 0.1)`
    pub fn mood_score(&self, movie: &Movie, mood: Mood) -> f32 {
        let mut score = 0.0f32;

        let genre_matches = movie
            .genres
            .iter()
            .filter(|g| mood.target_genres().contains(g))
            .count();
        score += genre_matches as f32 * 0.3;

        let description = movie.description_text();
        if !description.is_empty() {
            let keyword_hits = mood
                .keywords()
                .iter()
                .filter(|k| description.contains(*k))
                .count();
            score += keyword_hits as f32 * 0.2;
        }

        score += self.review_sentiment_fit(movie.id, mood) * 0.3;

        score += (movie.vote_average / 10.0) * 0.1;
        score += ((movie.popularity + 1.0).ln() / 10.0).min(0.1);

        score
    }

    /// Average sentiment compatibility over up to 10 reviews; 0.0 when the
    /// movie has none.
    fn review_sentiment_fit(&self, movie_id: MovieId, mood: Mood) -> f32 {
        let reviews = self.snapshot.reviews_for_movie(movie_id, MAX_REVIEWS);
        if reviews.is_empty() {
            return 0.0;
        }
        let total: f32 = reviews
            .iter()
            .map(|body| mood.sentiment_compatibility(sentiment_polarity(body)))
            .sum();
        total / reviews.len() as f32
    }

    /// Ranked mood recommendations for a user.
    ///
    /// Candidates carry at least one target genre, meet the vote-count
    /// floor, and exclude everything the user has rated. Ties on mood score
    /// break by popularity, then by id.
    #[instrument(skip(self), fields(mood = %mood))]
    pub fn recommend_for_mood(
        &self,
        user_id: UserId,
        mood: Mood,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let rated = self.snapshot.rated_movie_ids(user_id);

        let mut candidate_ids: HashSet<MovieId> = HashSet::new();
        for &genre in mood.target_genres() {
            candidate_ids.extend(self.snapshot.movies_in_genre(genre));
        }

        let mut scored: Vec<(MovieId, f32, f32)> = candidate_ids
            .into_iter()
            .filter(|id| !rated.contains(id))
            .filter_map(|id| self.snapshot.movie(id))
            .filter(|m| m.vote_count >= MIN_VOTE_COUNT)
            .map(|m| (m.id, self.mood_score(m, mood), m.popularity))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.2.partial_cmp(&a.2).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(limit);

        debug!(user_id, candidates = scored.len(), "scored mood candidates");
        Ok(scored
            .into_iter()
            .map(|(id, score, _)| Recommendation::new(id, ScoreSource::Mood, score))
            .collect())
    }

    /// Infer a mood from the user's last week of ratings.
    ///
    /// Each rated movie contributes `rating / 5.0` to its genres; each
    /// mood's score is the sum of its target-genre weights over the rating
    /// count. Returns `None` when the user has no recent activity or no
    /// genre signal.
    pub fn infer_recent_mood(&self, user_id: UserId, now: i64) -> Option<Mood> {
        let cutoff = now - RECENT_WINDOW_SECS;

        let mut genre_weights: HashMap<Genre, f32> = HashMap::new();
        let mut recent = 0usize;
        for rating in self.snapshot.ratings_for_user(user_id) {
            if rating.timestamp < cutoff {
                continue;
            }
            let Some(movie) = self.snapshot.movie(rating.movie_id) else {
                continue;
            };
            if movie.genres.is_empty() {
                continue;
            }
            let weight = rating.rating / 5.0;
            for &genre in &movie.genres {
                *genre_weights.entry(genre).or_insert(0.0) += weight;
            }
            recent += 1;
        }
        if recent == 0 || genre_weights.is_empty() {
            return None;
        }

        Mood::ALL
            .iter()
            .filter_map(|&mood| {
                let score: f32 = mood
                    .target_genres()
                    .iter()
                    .filter_map(|g| genre_weights.get(g))
                    .sum();
                (score > 0.0).then_some((mood, score / recent as f32))
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(mood, _)| mood)
    }
}

fn unix_time() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl Scorer for MoodScorer {
    fn name(&self) -> &'static str {
        "mood"
    }

    /// With no explicit mood, infer one from recent activity; popularity
    /// fallback when nothing recent exists.
    fn recommend(&self, user_id: UserId, limit: usize) -> Result<Vec<Recommendation>> {
        match self.infer_recent_mood(user_id, (self.clock)()) {
            Some(mood) => self.recommend_for_mood(user_id, mood, limit),
            None => {
                let rated = self.snapshot.rated_movie_ids(user_id);
                Ok(crate::types::popularity_fallback(&self.snapshot, &rated, limit))
            }
        }
    }

    /// Name the mood this movie fits best and the genres that match it
    fn explain(&self, _user_id: UserId, movie_id: MovieId) -> Option<Explanation> {
        let movie = self.snapshot.movie(movie_id)?;

        let (best_mood, best_score) = Mood::ALL
            .iter()
            .map(|&mood| (mood, self.mood_score(movie, mood)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;

        let matching_genres: Vec<Genre> = movie
            .genres
            .iter()
            .filter(|g| best_mood.target_genres().contains(g))
            .copied()
            .collect();

        Some(Explanation::Mood {
            reason: format!("Perfect for when you're feeling {}", best_mood),
            mood: best_mood,
            mood_score: best_score,
            matching_genres,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::Rating;

    fn movie(id: MovieId, genres: Vec<Genre>, overview: &str, popularity: f32) -> Movie {
        Movie {
            id,
            title: format!("Movie {}", id),
            overview: Some(overview.to_string()),
            tagline: None,
            genres,
            vote_average: 7.0,
            vote_count: 100,
            popularity,
            runtime: Some(100),
            release_year: Some(2018),
        }
    }

    fn create_test_snapshot() -> Arc<CatalogSnapshot> {
        let mut snapshot = CatalogSnapshot::new();
        snapshot.insert_movie(movie(
            1,
            vec![Genre::Comedy, Genre::Family],
            "An uplifting and fun family story full of joy",
            20.0,
        ));
        snapshot.insert_movie(movie(
            2,
            vec![Genre::Horror, Genre::Thriller],
            "A terrifying and creepy night in a haunted house",
            15.0,
        ));
        snapshot.insert_movie(movie(
            3,
            vec![Genre::Drama],
            "A tragic and heartbreaking story of loss",
            10.0,
        ));
        snapshot.build_genre_index();
        Arc::new(snapshot)
    }

    #[test]
    fn test_mood_parsing() {
        assert_eq!("Happy".parse::<Mood>().unwrap(), Mood::Happy);
        assert_eq!("scared".parse::<Mood>().unwrap(), Mood::Scared);

        let err = "melancholic".parse::<Mood>().unwrap_err();
        assert!(matches!(err, ScoreError::InvalidMood(_)));
    }

    #[test]
    fn test_genre_and_keyword_matches_raise_the_score() {
        let snapshot = create_test_snapshot();
        let scorer = MoodScorer::new(Arc::clone(&snapshot));

        let comedy = snapshot.movie(1).unwrap();
        let horror = snapshot.movie(2).unwrap();
        assert!(scorer.mood_score(comedy, Mood::Happy) > scorer.mood_score(horror, Mood::Happy));
        assert!(scorer.mood_score(horror, Mood::Scared) > scorer.mood_score(comedy, Mood::Scared));
    }

    #[test]
    fn test_recommend_for_mood_targets_genres_and_excludes_rated() {
        let mut snapshot = CatalogSnapshot::new();
        snapshot.insert_movie(movie(1, vec![Genre::Comedy], "fun", 20.0));
        snapshot.insert_movie(movie(2, vec![Genre::Comedy], "more fun", 10.0));
        snapshot.insert_movie(movie(3, vec![Genre::Horror], "creepy", 30.0));
        snapshot.insert_rating(Rating {
            user_id: 1,
            movie_id: 1,
            rating: 4.0,
            timestamp: 0,
        });
        snapshot.build_genre_index();
        let scorer = MoodScorer::new(Arc::new(snapshot));

        let recs = scorer.recommend_for_mood(1, Mood::Happy, 10).unwrap();
        let ids: Vec<_> = recs.iter().map(|r| r.movie_id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_scared_ignores_positive_reviews() {
        let mut snapshot = CatalogSnapshot::new();
        let horror = movie(1, vec![Genre::Horror], "", 10.0);
        snapshot.insert_movie(horror.clone());
        snapshot.insert_review(1, "an amazing wonderful masterpiece, loved it");
        snapshot.build_genre_index();
        let snapshot = Arc::new(snapshot);

        let scorer = MoodScorer::new(Arc::clone(&snapshot));
        // Positive polarity contributes nothing to the scared fit
        assert_eq!(scorer.review_sentiment_fit(1, Mood::Scared), 0.0);
        // But a negative review does
        let mut with_negative = CatalogSnapshot::new();
        with_negative.insert_movie(horror);
        with_negative.insert_review(1, "terrifying and creepy, dreadful scenes");
        let scorer = MoodScorer::new(Arc::new(with_negative));
        assert!(scorer.review_sentiment_fit(1, Mood::Scared) > 0.0);
    }

    #[test]
    fn test_infer_recent_mood_from_ratings() {
        let mut snapshot = CatalogSnapshot::new();
        snapshot.insert_movie(movie(1, vec![Genre::Horror, Genre::Thriller], "", 10.0));
        snapshot.insert_movie(movie(2, vec![Genre::Horror], "", 10.0));
        let now = 1_000_000i64;
        for (movie_id, ts) in [(1, now - 100), (2, now - 200)] {
            snapshot.insert_rating(Rating {
                user_id: 1,
                movie_id,
                rating: 5.0,
                timestamp: ts,
            });
        }
        snapshot.build_genre_index();
        let scorer = MoodScorer::new(Arc::new(snapshot));

        assert_eq!(scorer.infer_recent_mood(1, now), Some(Mood::Scared));
    }

    #[test]
    fn test_infer_recent_mood_ignores_old_ratings() {
        let mut snapshot = CatalogSnapshot::new();
        snapshot.insert_movie(movie(1, vec![Genre::Horror], "", 10.0));
        let now = 100_000_000i64;
        snapshot.insert_rating(Rating {
            user_id: 1,
            movie_id: 1,
            rating: 5.0,
            timestamp: now - RECENT_WINDOW_SECS - 1,
        });
        snapshot.build_genre_index();
        let scorer = MoodScorer::new(Arc::new(snapshot));

        assert_eq!(scorer.infer_recent_mood(1, now), None);
    }

    const FIXED_NOW: i64 = 1_000_000;

    fn fixed_clock() -> i64 {
        FIXED_NOW
    }

    #[test]
    fn test_recommend_infers_mood_through_the_injected_clock() {
        let mut snapshot = CatalogSnapshot::new();
        snapshot.insert_movie(movie(1, vec![Genre::Horror], "a haunted house", 10.0));
        snapshot.insert_movie(movie(2, vec![Genre::Horror], "a cursed doll", 12.0));
        snapshot.insert_movie(movie(3, vec![Genre::Comedy], "fun", 50.0));
        snapshot.insert_rating(Rating {
            user_id: 1,
            movie_id: 1,
            rating: 5.0,
            timestamp: FIXED_NOW - 100,
        });
        snapshot.build_genre_index();
        let scorer = MoodScorer::with_clock(Arc::new(snapshot), fixed_clock);

        // The recent horror rating reads as scared; the comedy stays out
        let recs = scorer.recommend(1, 5).unwrap();
        let ids: Vec<_> = recs.iter().map(|r| r.movie_id).collect();
        assert_eq!(ids, vec![2]);
        assert!(recs.iter().all(|r| r.source == ScoreSource::Mood));
    }

    #[test]
    fn test_recommend_without_recent_activity_uses_popularity() {
        let snapshot = create_test_snapshot();
        let scorer = MoodScorer::new(snapshot);

        let recs = scorer.recommend(42, 5).unwrap();
        assert!(!recs.is_empty());
        assert!(recs.iter().all(|r| r.source == ScoreSource::Popularity));
    }

    #[test]
    fn test_explain_picks_the_best_fitting_mood() {
        let snapshot = create_test_snapshot();
        let scorer = MoodScorer::new(snapshot);

        let explanation = scorer.explain(1, 2).unwrap();
        match explanation {
            Explanation::Mood {
                mood,
                matching_genres,
                ..
            } => {
                assert_eq!(mood, Mood::Scared);
                assert!(matching_genres.contains(&Genre::Horror));
            }
            other => panic!("expected mood explanation, got {:?}", other),
        }
    }
}
