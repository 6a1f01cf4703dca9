use async_trait::async_trait;
use moviebot_models::{AvailabilityInfo, MovieDetail, MovieId, MovieSummary};

use crate::error::UpstreamError;

/// Read-only movie metadata backend.
///
/// Every call is a single bounded request; failures come back as-is.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Relevance-ordered matches, empty when nothing was found
    async fn search_by_title(&self, query: &str) -> Result<Vec<MovieSummary>, UpstreamError>;
    async fn fetch_trending(&self) -> Result<Vec<MovieSummary>, UpstreamError>;
    async fn fetch_details(&self, movie_id: MovieId) -> Result<MovieDetail, UpstreamError>;
    async fn fetch_availability(&self, movie_id: MovieId) -> Result<AvailabilityInfo, UpstreamError>;

    /// Absolute poster URL for a detail's `poster_path`
    fn poster_url(&self, poster_path: &str) -> String;
}
