mod cache;
mod tracker;
mod trajectory;
mod types;

pub use cache::{TrajectoryCache, DEFAULT_TTL};
pub use tracker::LocationTracker;
pub use trajectory::TrajectorySettings;
pub use types::{CurrentLocation, TrajectoryPoint};
