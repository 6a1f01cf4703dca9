use moviebot_models::{release_year, AvailabilityInfo, MovieDetail, MovieSummary, RegionAvailability};
use serde::Deserialize;
use std::collections::HashMap;

/// Trending listings show at most this many titles
pub const TRENDING_LIMIT: usize = 10;

const UNKNOWN_TITLE: &str = "Unknown";
const EMPTY_OVERVIEW: &str = "—";

#[derive(Debug, Deserialize)]
pub struct TmdbPage {
    #[serde(default)]
    pub results: Vec<TmdbMovie>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    pub title: Option<String>,
    pub release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbMovieDetails {
    pub id: u64,
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    pub poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbGenre {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbWatchProviders {
    #[serde(default)]
    pub results: HashMap<String, TmdbRegionProviders>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbRegionProviders {
    pub link: Option<String>,
    #[serde(default)]
    pub flatrate: Vec<TmdbProvider>,
    #[serde(default)]
    pub rent: Vec<TmdbProvider>,
    #[serde(default)]
    pub buy: Vec<TmdbProvider>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbProvider {
    pub provider_name: Option<String>,
}

fn title_or_unknown(title: Option<String>) -> String {
    title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
}

pub fn to_summary(movie: TmdbMovie) -> MovieSummary {
    MovieSummary {
        id: movie.id,
        release_year: release_year(movie.release_date.as_deref()),
        title: title_or_unknown(movie.title),
    }
}

pub fn to_summaries(page: TmdbPage, limit: Option<usize>) -> Vec<MovieSummary> {
    let take = limit.unwrap_or(usize::MAX);
    page.results.into_iter().take(take).map(to_summary).collect()
}

pub fn to_detail(details: TmdbMovieDetails) -> MovieDetail {
    let overview = details
        .overview
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .unwrap_or_else(|| EMPTY_OVERVIEW.to_string());

    MovieDetail {
        id: details.id,
        release_year: release_year(details.release_date.as_deref()),
        title: title_or_unknown(details.title),
        overview,
        rating: details.vote_average,
        genres: details
            .genres
            .into_iter()
            .filter_map(|g| g.name)
            .filter(|name| !name.is_empty())
            .collect(),
        poster_path: details.poster_path.filter(|p| !p.is_empty()),
    }
}

/// Provider names in API order with duplicates dropped
fn provider_names(providers: Vec<TmdbProvider>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in providers.into_iter().filter_map(|p| p.provider_name) {
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

pub fn to_availability(providers: TmdbWatchProviders) -> AvailabilityInfo {
    let regions = providers
        .results
        .into_iter()
        .map(|(code, region)| {
            let availability = RegionAvailability {
                subscription: provider_names(region.flatrate),
                rent: provider_names(region.rent),
                buy: provider_names(region.buy),
                link: region.link.filter(|l| !l.is_empty()),
            };
            (code, availability)
        })
        .collect();

    AvailabilityInfo { regions }
}
