pub mod providers;
pub mod recency;
pub mod recommendations;

pub use recency::RecencyList;
pub use recommendations::{RecentlyViewed, RecommendationStore, Recommendations};
