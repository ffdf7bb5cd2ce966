//! The hybrid engine: one front door over all scoring strategies.
//!
//! ## Request flow
//! 1. Pick blend weights from the user's rating count.
//! 2. Ask content, collaborative, and trending sources for candidates
//!    (each up to twice the requested limit).
//! 3. Fuse with rank decay and return the top N.
//!
//! ## Train/publish lifecycle
//! Similarity models are built off the async runtime with `spawn_blocking`
//! and published atomically by swapping an `Arc<ScorerSet>` behind an
//! `RwLock`. Readers hold the previous set until the swap, so requests are
//! never served from a half-built model. At most one rebuild runs at a
//! time; a second `train` call while one is in flight reports back without
//! doing anything. A failed rebuild leaves the previous models in service.

use crate::blend::{blend_weights, fuse};
use crate::explain::{HybridExplanation, combine};
use anyhow::{Context, Result};
use catalog::{CatalogSnapshot, MovieId, TrendingPeriod, UserId};
use scorers::{
    CollaborativeModel, CollaborativeScorer, ContentModel, ContentScorer, Explanation,
    GroupScorer, Mood, MoodScorer, Recommendation, ScoreError, ScoreSource, Scorer,
    friend_recommendations, popularity_fallback,
};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, instrument, warn};

/// The scorers built from one snapshot, published as a unit.
///
/// Content and collaborative scorers need trained models and may be absent
/// when the snapshot is too thin; mood and group scoring are stateless and
/// always available.
pub struct ScorerSet {
    pub content: Option<ContentScorer>,
    pub collaborative: Option<CollaborativeScorer>,
    pub mood: MoodScorer,
    pub group: GroupScorer,
}

impl ScorerSet {
    /// Build every scorer from the snapshot. The flag reports whether both
    /// trained models came up; a thin snapshot still yields a usable set.
    pub fn build(snapshot: Arc<CatalogSnapshot>) -> (Self, bool) {
        let content = match ContentModel::build(&snapshot) {
            Ok(model) => Some(ContentScorer::new(Arc::clone(&snapshot), model)),
            Err(error) => {
                warn!(%error, "content model unavailable");
                None
            }
        };
        let collaborative = match CollaborativeModel::build(&snapshot) {
            Ok(model) => Some(CollaborativeScorer::new(Arc::clone(&snapshot), model)),
            Err(error) => {
                warn!(%error, "collaborative model unavailable");
                None
            }
        };
        let success = content.is_some() && collaborative.is_some();

        let set = Self {
            content,
            collaborative,
            mood: MoodScorer::new(Arc::clone(&snapshot)),
            group: GroupScorer::new(snapshot),
        };
        (set, success)
    }
}

/// Hybrid recommendation engine over a catalog snapshot
pub struct HybridEngine {
    snapshot: Arc<CatalogSnapshot>,
    scorers: RwLock<Arc<ScorerSet>>,
    /// Held for the duration of a rebuild; try-locked so a concurrent
    /// train call skips instead of queueing
    training: tokio::sync::Mutex<()>,
}

impl HybridEngine {
    /// Build an engine and its initial scorer set from a snapshot
    pub fn new(snapshot: Arc<CatalogSnapshot>) -> Self {
        let (set, success) = ScorerSet::build(Arc::clone(&snapshot));
        if !success {
            warn!("engine started with partial scorer set");
        }
        Self {
            snapshot,
            scorers: RwLock::new(Arc::new(set)),
            training: tokio::sync::Mutex::new(()),
        }
    }

    /// The currently published scorer set
    fn current(&self) -> Arc<ScorerSet> {
        Arc::clone(&self.scorers.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Rebuild all models and publish them atomically.
    ///
    /// Returns whether both trained models built successfully. Returns
    /// `false` without rebuilding when another train is already running.
    #[instrument(skip(self))]
    pub async fn train(&self) -> bool {
        let Ok(_guard) = self.training.try_lock() else {
            info!("training already in progress, skipping");
            return false;
        };

        let snapshot = Arc::clone(&self.snapshot);
        match tokio::task::spawn_blocking(move || ScorerSet::build(snapshot)).await {
            Ok((set, success)) => {
                let mut slot = self.scorers.write().unwrap_or_else(PoisonError::into_inner);
                *slot = Arc::new(set);
                info!(success, "published rebuilt scorer set");
                success
            }
            Err(error) => {
                warn!(%error, "training task panicked, keeping previous models");
                false
            }
        }
    }

    /// Blended personal recommendations.
    ///
    /// Sources that cannot serve this user contribute nothing; if every
    /// source comes back empty the result degrades to popularity ranking.
    #[instrument(skip(self))]
    pub async fn personal_recommendations(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let set = self.current();
        let snapshot = Arc::clone(&self.snapshot);

        tokio::task::spawn_blocking(move || {
            let weights = blend_weights(snapshot.rating_count(user_id));
            debug!(user_id, ?weights, "selected blend weights");

            let content = set
                .content
                .as_ref()
                .and_then(|s| s.recommend(user_id, limit * 2).ok())
                .unwrap_or_default();
            let collaborative = set
                .collaborative
                .as_ref()
                .and_then(|s| s.recommend(user_id, limit * 2).ok())
                .unwrap_or_default();
            let trending = trending_for_user(&snapshot, user_id, limit);

            let fused = fuse(
                &[
                    (weights.content, content),
                    (weights.collaborative, collaborative),
                    (weights.popularity, trending),
                ],
                limit,
            );
            if fused.is_empty() {
                let rated = snapshot.rated_movie_ids(user_id);
                return popularity_fallback(&snapshot, &rated, limit);
            }
            fused
        })
        .await
        .context("recommendation task panicked")
    }

    /// Movies most similar to the given one.
    ///
    /// Surfaces `ScoreError::NotIndexed` when the movie is not in the
    /// content matrix (or the matrix could not be built at all).
    #[instrument(skip(self))]
    pub async fn similar_movies(
        &self,
        movie_id: MovieId,
        limit: usize,
        exclude: HashSet<MovieId>,
    ) -> Result<Vec<Recommendation>> {
        let set = self.current();

        let result = tokio::task::spawn_blocking(move || {
            set.content
                .as_ref()
                .ok_or(ScoreError::NotIndexed { movie_id })?
                .similar_movies(movie_id, limit, &exclude)
        })
        .await
        .context("similarity task panicked")?;

        Ok(result?)
    }

    /// Movies the user's accepted friends loved. Empty when the user has
    /// no friends; that is not an error.
    #[instrument(skip(self))]
    pub async fn friend_recommendations(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let friends: Vec<UserId> = self.snapshot.accepted_friend_ids(user_id).to_vec();
        if friends.is_empty() {
            return Ok(Vec::new());
        }
        let snapshot = Arc::clone(&self.snapshot);

        tokio::task::spawn_blocking(move || {
            friend_recommendations(&snapshot, user_id, &friends, limit)
        })
        .await
        .context("friend recommendation task panicked")
    }

    /// Mood recommendations.
    ///
    /// With an explicit mood string, unknown values surface
    /// `ScoreError::InvalidMood`. Without one, the user's recent activity
    /// picks the mood; with no recent activity the result degrades to
    /// popularity ranking.
    #[instrument(skip(self))]
    pub async fn mood_recommendations(
        &self,
        user_id: UserId,
        mood: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Recommendation>> {
        let requested = match mood {
            Some(label) => Some(label.parse::<Mood>()?),
            None => None,
        };
        let set = self.current();
        let snapshot = Arc::clone(&self.snapshot);

        let result = tokio::task::spawn_blocking(move || {
            let now = unix_now();
            match requested.or_else(|| set.mood.infer_recent_mood(user_id, now)) {
                Some(mood) => set.mood.recommend_for_mood(user_id, mood, limit),
                None => {
                    debug!(user_id, "no mood and no recent activity, using popularity");
                    let rated = snapshot.rated_movie_ids(user_id);
                    Ok(popularity_fallback(&snapshot, &rated, limit))
                }
            }
        })
        .await
        .context("mood recommendation task panicked")?;

        Ok(result?)
    }

    /// Watch-party recommendations that balance every member's taste.
    ///
    /// Surfaces `ScoreError::InvalidGroupSize` for groups under 2 distinct
    /// users. `min_satisfaction` defaults to 0.6.
    #[instrument(skip(self, user_ids), fields(group_size = user_ids.len()))]
    pub async fn group_recommendations(
        &self,
        user_ids: Vec<UserId>,
        limit: usize,
        min_satisfaction: Option<f32>,
    ) -> Result<Vec<Recommendation>> {
        let set = self.current();
        let floor = min_satisfaction.unwrap_or(scorers::DEFAULT_MIN_SATISFACTION);

        let result = tokio::task::spawn_blocking(move || {
            set.group.recommend_for_group(&user_ids, limit, floor)
        })
        .await
        .context("group recommendation task panicked")?;

        Ok(result?)
    }

    /// Why this movie for this user, combined across every scorer that has
    /// something to say. `None` when no scorer does.
    #[instrument(skip(self))]
    pub async fn explain(
        &self,
        user_id: UserId,
        movie_id: MovieId,
    ) -> Result<Option<HybridExplanation>> {
        let set = self.current();
        let snapshot = Arc::clone(&self.snapshot);

        tokio::task::spawn_blocking(move || {
            let mut signals: Vec<Explanation> = Vec::new();

            if let Some(explanation) = set
                .content
                .as_ref()
                .and_then(|s| s.explain(user_id, movie_id))
            {
                signals.push(explanation);
            }
            if let Some(explanation) = set
                .collaborative
                .as_ref()
                .and_then(|s| s.explain(user_id, movie_id))
            {
                signals.push(explanation);
            }
            if let Some(explanation) = trending_explanation(&snapshot, movie_id) {
                signals.push(explanation);
            }

            combine(signals)
        })
        .await
        .context("explanation task panicked")
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Trending-today ids followed by the popular list, deduplicated and with
/// the user's rated movies removed.
fn trending_for_user(
    snapshot: &CatalogSnapshot,
    user_id: UserId,
    limit: usize,
) -> Vec<Recommendation> {
    let rated = snapshot.rated_movie_ids(user_id);
    let mut seen: HashSet<MovieId> = HashSet::new();
    let mut out = Vec::with_capacity(limit);

    let candidates = snapshot
        .trending_movie_ids(TrendingPeriod::Day)
        .iter()
        .copied()
        .chain(snapshot.popular_movies(limit + rated.len()));
    for id in candidates {
        if out.len() >= limit {
            break;
        }
        if rated.contains(&id) || !seen.insert(id) {
            continue;
        }
        let popularity = snapshot.movie(id).map_or(0.0, |m| m.popularity);
        out.push(Recommendation::new(id, ScoreSource::Popularity, popularity));
    }
    out
}

/// Day trending wins over week when a movie appears in both lists
fn trending_explanation(snapshot: &CatalogSnapshot, movie_id: MovieId) -> Option<Explanation> {
    if snapshot
        .trending_movie_ids(TrendingPeriod::Day)
        .contains(&movie_id)
    {
        Some(Explanation::Trending {
            reason: "This movie is trending today".to_string(),
            period: TrendingPeriod::Day,
        })
    } else if snapshot
        .trending_movie_ids(TrendingPeriod::Week)
        .contains(&movie_id)
    {
        Some(Explanation::Trending {
            reason: "This movie is trending this week".to_string(),
            period: TrendingPeriod::Week,
        })
    } else {
        None
    }
}
