// Read-only hotel and review snapshot the rest of the crate queries

use std::collections::HashSet;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Hotel, WifiReview};

// Sample data bundled with the crate
pub const SAMPLE_CATALOG_JSON: &str = include_str!("../data/sample_catalog.json");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Duplicate hotel id: {0}")]
    DuplicateHotel(String),
}

// Shape of a catalog document on the wire
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CatalogDocument {
    pub hotels: Vec<Hotel>,
    #[serde(default)]
    pub reviews: Vec<WifiReview>,
}

// Aggregated measurements over the reviews of one hotel that carry a download speed
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedStats {
    pub avg_down: f64,
    pub avg_up: f64,
    pub avg_ping: f64,
    pub count: usize,
}

#[derive(Debug, Default)]
pub struct Catalog {
    // Kept in the fixed order the provider supplied
    hotels: Vec<Hotel>,
    // Reviews grouped by hotel id, each group in supply order
    reviews: DashMap<String, Vec<WifiReview>>,
}

impl Catalog {
    pub fn new(hotels: Vec<Hotel>, reviews: Vec<WifiReview>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for hotel in &hotels {
            if !seen.insert(hotel.id.as_str()) {
                return Err(CatalogError::DuplicateHotel(hotel.id.clone()));
            }
        }

        let index: DashMap<String, Vec<WifiReview>> = DashMap::new();
        for review in reviews {
            if !seen.contains(review.hotel_id.as_str()) {
                warn!(
                    review_id = %review.id,
                    hotel_id = %review.hotel_id,
                    "review references an unknown hotel"
                );
            }
            index.entry(review.hotel_id.clone()).or_default().push(review);
        }

        debug!(hotels = hotels.len(), "catalog loaded");

        Ok(Self {
            hotels,
            reviews: index,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = serde_json::from_str(json)
            .map_err(|e| CatalogError::JsonParseError(e.to_string()))?;

        Self::new(doc.hotels, doc.reviews)
    }

    // The five hotels and five reviews bundled with the crate
    pub fn sample() -> Result<Self, CatalogError> {
        Self::from_json(SAMPLE_CATALOG_JSON)
    }

    pub fn hotels(&self) -> &[Hotel] {
        &self.hotels
    }

    pub fn hotel(&self, hotel_id: &str) -> Option<&Hotel> {
        self.hotels.iter().find(|h| h.id == hotel_id)
    }

    pub fn reviews_for(&self, hotel_id: &str) -> Vec<WifiReview> {
        self.reviews
            .get(hotel_id)
            .map(|reviews| reviews.value().clone())
            .unwrap_or_default()
    }

    pub fn review_count(&self) -> usize {
        self.reviews.iter().map(|entry| entry.value().len()).sum()
    }

    // Missing upload or ping values count as zero in the averages
    pub fn speed_stats(&self, hotel_id: &str) -> Option<SpeedStats> {
        let reviews = self.reviews.get(hotel_id)?;
        let measured: Vec<&WifiReview> = reviews
            .value()
            .iter()
            .filter(|r| r.speed_down.is_some_and(|d| d != 0.0))
            .collect();

        if measured.is_empty() {
            return None;
        }

        let count = measured.len();
        let avg = |pick: fn(&WifiReview) -> Option<f64>| {
            measured.iter().map(|r| pick(r).unwrap_or(0.0)).sum::<f64>() / count as f64
        };

        Some(SpeedStats {
            avg_down: avg(|r| r.speed_down),
            avg_up: avg(|r| r.speed_up),
            avg_ping: avg(|r| r.ping),
            count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PriceRange;

    fn hotel(id: &str) -> Hotel {
        Hotel {
            id: id.to_string(),
            name: format!("Hotel {id}"),
            address: "Somewhere 1".to_string(),
            city: "Nowhere".to_string(),
            country: "Deutschland".to_string(),
            avg_wifi_rating: 4.0,
            num_reviews: 0,
            image_url: None,
            distance: None,
            price_range: PriceRange::Moderate,
            amenities: vec![],
        }
    }

    #[test]
    fn test_sample_catalog_loads() {
        let catalog = Catalog::sample().unwrap();
        assert_eq!(catalog.hotels().len(), 5);
        assert_eq!(catalog.review_count(), 5);

        let ids: Vec<&str> = catalog.hotels().iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);

        let berlin = catalog.hotel("1").unwrap();
        assert_eq!(berlin.city, "Berlin");
        assert_eq!(berlin.price_range, PriceRange::Upscale);
        assert_eq!(berlin.distance, Some(0.3));
        assert!(catalog.hotel("42").is_none());
    }

    #[test]
    fn test_reviews_are_grouped_by_hotel_in_supply_order() {
        let catalog = Catalog::sample().unwrap();

        let reviews = catalog.reviews_for("1");
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].id, "r1");
        assert_eq!(reviews[1].id, "r2");

        assert!(catalog.reviews_for("5").is_empty());
    }

    #[test]
    fn test_speed_stats_average_measured_reviews() {
        let catalog = Catalog::sample().unwrap();

        let stats = catalog.speed_stats("1").unwrap();
        assert_eq!(stats.count, 2);
        assert!((stats.avg_down - 146.4).abs() < 1e-9);
        assert!((stats.avg_up - 43.5).abs() < 1e-9);
        assert!((stats.avg_ping - 13.5).abs() < 1e-9);

        assert!(catalog.speed_stats("5").is_none());
    }

    #[test]
    fn test_duplicate_hotel_ids_are_rejected() {
        let result = Catalog::new(vec![hotel("a"), hotel("a")], vec![]);
        assert!(matches!(result, Err(CatalogError::DuplicateHotel(id)) if id == "a"));
    }

    #[test]
    fn test_orphan_reviews_are_kept() {
        let orphan: WifiReview = serde_json::from_str(
            r#"{"id":"x","hotelId":"missing","userName":"n","rating":3,"createdAt":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        let catalog = Catalog::new(vec![hotel("a")], vec![orphan]).unwrap();
        assert_eq!(catalog.reviews_for("missing").len(), 1);
        assert!(catalog.speed_stats("missing").is_none());
    }

    #[test]
    fn test_malformed_document_is_a_parse_error() {
        let result = Catalog::from_json("{\"hotels\": 3}");
        assert!(matches!(result, Err(CatalogError::JsonParseError(_))));
    }
}
