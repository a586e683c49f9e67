// Data records shared by the catalog, the search engine, the speed test and the review flow

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Price tier of a hotel, ordered from cheapest to most expensive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum PriceRange {
    #[serde(rename = "$")]
    Budget,
    #[serde(rename = "$$")]
    Moderate,
    #[serde(rename = "$$$")]
    Upscale,
    #[serde(rename = "$$$$")]
    Luxury,
}

impl PriceRange {
    pub fn symbol(&self) -> &'static str {
        match self {
            PriceRange::Budget => "$",
            PriceRange::Moderate => "$$",
            PriceRange::Upscale => "$$$",
            PriceRange::Luxury => "$$$$",
        }
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    pub id: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub country: String,
    // Average WiFi rating on a 0-5 scale, not validated
    pub avg_wifi_rating: f64,
    pub num_reviews: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    // Kilometers from the traveler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    pub price_range: PriceRange,
    // Free-form labels, duplicates are kept as supplied
    #[serde(default)]
    pub amenities: Vec<String>,
}

impl Hotel {
    pub fn signal_strength(&self) -> SignalStrength {
        SignalStrength::for_rating(self.avg_wifi_rating)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WifiReview {
    pub id: String,
    pub hotel_id: String,
    pub user_name: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    // Mbps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_down: Option<f64>,
    // Mbps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_up: Option<f64>,
    // Milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping: Option<f64>,
    pub created_at: DateTime<Utc>,
}

// Key the search results are ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    // Highest average rating first
    #[default]
    Rating,
    // Closest first, hotels without a distance count as 0 km
    Distance,
    // Most reviewed first
    Reviews,
}

impl SortBy {
    pub fn label(&self) -> &'static str {
        match self {
            SortBy::Rating => "WiFi rating",
            SortBy::Distance => "Distance",
            SortBy::Reviews => "Number of reviews",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    #[serde(default)]
    pub min_rating: Option<f64>,
    #[serde(default)]
    pub max_distance: Option<f64>,
    // Acceptable tiers, an empty or missing set accepts every tier
    #[serde(default)]
    pub price_range: Option<Vec<PriceRange>>,
    #[serde(default)]
    pub sort_by: SortBy,
}

impl SearchFilters {
    pub fn sorted_by(sort_by: SortBy) -> Self {
        Self {
            sort_by,
            ..Default::default()
        }
    }

    // True when any narrowing filter is set, the sort key does not count
    pub fn has_active_filters(&self) -> bool {
        self.min_rating.is_some_and(|r| r > 0.0)
            || self.max_distance.is_some_and(|d| d > 0.0)
            || self.price_range.as_ref().is_some_and(|p| !p.is_empty())
    }
}

// Synthetic measurement produced by one completed speed-test run
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedTestResult {
    pub download_speed: u32,
    pub upload_speed: u32,
    pub ping: u32,
    pub timestamp: DateTime<Utc>,
}

impl SpeedTestResult {
    pub fn quality(&self) -> SpeedQuality {
        SpeedQuality::classify(self.download_speed as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedQuality {
    Excellent,
    Good,
    Okay,
    Poor,
}

impl SpeedQuality {
    // Buckets a download speed in Mbps
    pub fn classify(download_mbps: f64) -> Self {
        if download_mbps >= 50.0 {
            SpeedQuality::Excellent
        } else if download_mbps >= 25.0 {
            SpeedQuality::Good
        } else if download_mbps >= 10.0 {
            SpeedQuality::Okay
        } else {
            SpeedQuality::Poor
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpeedQuality::Excellent => "Excellent",
            SpeedQuality::Good => "Good",
            SpeedQuality::Okay => "Okay",
            SpeedQuality::Poor => "Poor",
        }
    }
}

// Wording shown next to the selected number of stars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingLabel {
    Poor,
    Fair,
    Good,
    VeryGood,
    Excellent,
}

impl RatingLabel {
    pub fn for_stars(stars: u8) -> Option<Self> {
        match stars {
            1 => Some(RatingLabel::Poor),
            2 => Some(RatingLabel::Fair),
            3 => Some(RatingLabel::Good),
            4 => Some(RatingLabel::VeryGood),
            5 => Some(RatingLabel::Excellent),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RatingLabel::Poor => "Poor",
            RatingLabel::Fair => "Fair",
            RatingLabel::Good => "Good",
            RatingLabel::VeryGood => "Very good",
            RatingLabel::Excellent => "Excellent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalStrength {
    Strong,
    Medium,
    Weak,
}

impl SignalStrength {
    pub fn for_rating(avg_rating: f64) -> Self {
        if avg_rating >= 4.5 {
            SignalStrength::Strong
        } else if avg_rating >= 3.5 {
            SignalStrength::Medium
        } else {
            SignalStrength::Weak
        }
    }
}
