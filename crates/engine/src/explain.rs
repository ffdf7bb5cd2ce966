//! Combined explanations across scoring strategies.
//!
//! Each scorer can tell its own story about a (user, movie) pair; this
//! module folds those stories into a single answer with a primary reason,
//! supporting factors, and a confidence that grows with the number of
//! independent signals.

use scorers::Explanation;
use serde::Serialize;

/// Confidence contributed by each independent explanation
const CONFIDENCE_PER_SIGNAL: f32 = 0.3;

/// Qualitative strength of a combined explanation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStrength {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RecommendationStrength {
    fn from_signal_count(count: usize) -> Self {
        match count {
            0 => RecommendationStrength::Low,
            1 => RecommendationStrength::Medium,
            2 => RecommendationStrength::High,
            _ => RecommendationStrength::VeryHigh,
        }
    }
}

/// One combined answer to "why this movie for this user"
#[derive(Debug, Clone, Serialize)]
pub struct HybridExplanation {
    /// The strongest single reason, shown first
    pub primary_reason: String,
    /// Type label of the primary signal ("content_based", "collaborative", ...)
    pub explanation_type: &'static str,
    /// 0.3 per contributing signal
    pub confidence_score: f32,
    /// Reasons from the remaining signals
    pub additional_factors: Vec<String>,
    pub strength: RecommendationStrength,
    /// The structured per-source explanations this was combined from
    pub signals: Vec<Explanation>,
}

/// Combine per-source explanations, strongest first. `None` when no scorer
/// had anything to say.
pub fn combine(explanations: Vec<Explanation>) -> Option<HybridExplanation> {
    let primary = explanations.first()?;

    Some(HybridExplanation {
        primary_reason: primary.reason().to_string(),
        explanation_type: primary.kind(),
        confidence_score: explanations.len() as f32 * CONFIDENCE_PER_SIGNAL,
        additional_factors: explanations
            .iter()
            .skip(1)
            .map(|e| e.reason().to_string())
            .collect(),
        strength: RecommendationStrength::from_signal_count(explanations.len()),
        signals: explanations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::TrendingPeriod;

    fn collaborative() -> Explanation {
        Explanation::Collaborative {
            reason: "3 users with similar taste rated this 4.5 on average".to_string(),
            supporting_users: 3,
            average_rating: 4.5,
        }
    }

    fn trending() -> Explanation {
        Explanation::Trending {
            reason: "This movie is trending today".to_string(),
            period: TrendingPeriod::Day,
        }
    }

    #[test]
    fn test_combine_empty_is_none() {
        assert!(combine(vec![]).is_none());
    }

    #[test]
    fn test_single_signal_is_medium() {
        let combined = combine(vec![collaborative()]).unwrap();
        assert_eq!(combined.explanation_type, "collaborative");
        assert_eq!(combined.strength, RecommendationStrength::Medium);
        assert!((combined.confidence_score - 0.3).abs() < 1e-6);
        assert!(combined.additional_factors.is_empty());
    }

    #[test]
    fn test_two_signals_are_high() {
        let combined = combine(vec![collaborative(), trending()]).unwrap();
        assert_eq!(combined.strength, RecommendationStrength::High);
        assert!((combined.confidence_score - 0.6).abs() < 1e-6);
        assert_eq!(combined.additional_factors.len(), 1);
        assert_eq!(combined.additional_factors[0], "This movie is trending today");
    }

    #[test]
    fn test_three_signals_are_very_high() {
        let combined = combine(vec![collaborative(), trending(), collaborative()]).unwrap();
        assert_eq!(combined.strength, RecommendationStrength::VeryHigh);
    }
}
