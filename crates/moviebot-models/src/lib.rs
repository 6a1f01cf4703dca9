pub mod availability;
pub mod movie;
pub mod watchlist;

pub use availability::{AvailabilityInfo, RegionAvailability};
pub use movie::{release_year, MovieDetail, MovieId, MovieSummary};
pub use watchlist::{UserId, WatchlistEntry};
