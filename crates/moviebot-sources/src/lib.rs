pub mod error;
pub mod tmdb;
pub mod traits;

pub use error::UpstreamError;
pub use tmdb::TmdbClient;
pub use traits::MetadataSource;
