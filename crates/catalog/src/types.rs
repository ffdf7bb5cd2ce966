//! Core domain types for the movie catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases keep user and movie ids from getting mixed up in signatures.

/// Unique identifier for a user
pub type UserId = u32;

/// Unique identifier for a movie
pub type MovieId = u32;

/// Movie genres as used by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Action,
    Adventure,
    Animation,
    Comedy,
    Crime,
    Documentary,
    Drama,
    Family,
    Fantasy,
    History,
    Horror,
    Music,
    Mystery,
    Romance,
    ScienceFiction,
    Thriller,
    War,
    Western,
}

impl Genre {
    /// All genres, in a stable order.
    pub const ALL: [Genre; 18] = [
        Genre::Action,
        Genre::Adventure,
        Genre::Animation,
        Genre::Comedy,
        Genre::Crime,
        Genre::Documentary,
        Genre::Drama,
        Genre::Family,
        Genre::Fantasy,
        Genre::History,
        Genre::Horror,
        Genre::Music,
        Genre::Mystery,
        Genre::Romance,
        Genre::ScienceFiction,
        Genre::Thriller,
        Genre::War,
        Genre::Western,
    ];

    /// Human-readable genre name, as shown in explanations.
    pub fn name(&self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Animation => "Animation",
            Genre::Comedy => "Comedy",
            Genre::Crime => "Crime",
            Genre::Documentary => "Documentary",
            Genre::Drama => "Drama",
            Genre::Family => "Family",
            Genre::Fantasy => "Fantasy",
            Genre::History => "History",
            Genre::Horror => "Horror",
            Genre::Music => "Music",
            Genre::Mystery => "Mystery",
            Genre::Romance => "Romance",
            Genre::ScienceFiction => "Science Fiction",
            Genre::Thriller => "Thriller",
            Genre::War => "War",
            Genre::Western => "Western",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single rating from a user for a movie.
///
/// Ratings range from 0.5 to 5.0 in half-star steps. Once a scorer has read
/// a rating it never changes underneath it; updates land in the next snapshot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub movie_id: MovieId,
    /// Rating value from 0.5 to 5.0 in 0.5 steps
    pub rating: f32,
    /// Unix timestamp when the rating was made
    pub timestamp: i64,
}

/// Movie metadata as supplied by the external catalog.
///
/// Vote statistics and popularity come from the catalog itself, not from the
/// ratings in this snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub genres: Vec<Genre>,
    pub vote_average: f32,
    pub vote_count: u32,
    pub popularity: f32,
    pub runtime: Option<u32>,
    pub release_year: Option<u16>,
}

impl Movie {
    /// Combined text used for content similarity: overview, tagline, and
    /// genre names joined into one blob.
    pub fn content_text(&self) -> String {
        let mut text = String::new();
        if let Some(overview) = &self.overview {
            text.push_str(overview);
        }
        if let Some(tagline) = &self.tagline {
            text.push(' ');
            text.push_str(tagline);
        }
        for genre in &self.genres {
            text.push(' ');
            text.push_str(genre.name());
        }
        text
    }

    /// Overview and tagline only, used for keyword matching.
    pub fn description_text(&self) -> String {
        let mut text = String::new();
        if let Some(overview) = &self.overview {
            text.push_str(overview);
        }
        if let Some(tagline) = &self.tagline {
            text.push(' ');
            text.push_str(tagline);
        }
        text.to_lowercase()
    }
}

/// Window for trending-movie lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendingPeriod {
    Day,
    Week,
}
