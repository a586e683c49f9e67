// Main library file for the hotel WiFi finder

// Export modules for each part of the application
pub mod catalog;
pub mod config;
pub mod models;
pub mod review;
pub mod search;
pub mod session;
pub mod speedtest;

// Re-export key types for convenience
pub use catalog::{Catalog, CatalogError, SpeedStats};
pub use config::{AppConfig, ConfigError, SearchConfig, SpeedTestConfig};
pub use models::{Hotel, PriceRange, SearchFilters, SortBy, SpeedTestResult, WifiReview};
pub use review::{ConfirmingConsumer, Notification, ReviewConsumer, ReviewDraft, ReviewError, ReviewSubmission};
pub use search::HotelSearch;
pub use session::{HotelDetails, Session, SessionError, Tab};
pub use speedtest::{Phase, SpeedTest, SpeedTestError, SpeedTestEvent, SpeedTestState};
