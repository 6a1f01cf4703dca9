use serde::{Deserialize, Serialize};

/// TMDB movie identifier
pub type MovieId = u64;

/// A search or trending hit. Only carries what a results button needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: MovieId,
    pub title: String,
    pub release_year: Option<String>,
}

/// Full record fetched when a user picks a result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetail {
    pub id: MovieId,
    pub title: String,
    pub release_year: Option<String>,
    pub overview: String,
    pub rating: Option<f64>,
    pub genres: Vec<String>, // API order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
}

/// Extract the year from an ISO `release_date` ("2014-11-05" -> "2014").
///
/// TMDB sends an empty string for unreleased titles, which maps to `None`.
pub fn release_year(release_date: Option<&str>) -> Option<String> {
    let date = release_date?.trim();
    if date.is_empty() {
        return None;
    }
    Some(date.chars().take(4).collect())
}
