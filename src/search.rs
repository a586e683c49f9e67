// Hotel search: free-text match, rating/distance/price filters and ordering

use std::cmp::Ordering;

use tracing::debug;

use crate::{
    config::SearchConfig,
    models::{Hotel, SearchFilters, SortBy},
};

// Case-insensitive substring match against name, city and address.
// An empty or whitespace-only query matches every hotel.
pub fn matches_query(hotel: &Hotel, query: &str) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return true;
    }

    let query = query.to_lowercase();
    [&hotel.name, &hotel.city, &hotel.address]
        .iter()
        .any(|field| field.to_lowercase().contains(&query))
}

// Hotel search engine. Stateless apart from its configuration, every call is a pure query.
#[derive(Debug, Clone, Default)]
pub struct HotelSearch {
    config: SearchConfig,
}

impl HotelSearch {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    // Produce the ordered subset of `hotels` satisfying the query and every filter
    pub fn search(&self, hotels: &[Hotel], query: &str, filters: &SearchFilters) -> Vec<Hotel> {
        let mut filtered: Vec<Hotel> = hotels
            .iter()
            .filter(|hotel| matches_query(hotel, query) && Self::passes_filters(hotel, filters))
            .cloned()
            .collect();

        // sort_by is stable, ties keep the catalog order
        filtered.sort_by(|a, b| Self::compare(a, b, filters.sort_by));

        debug!(
            query = query.trim(),
            sort_by = ?filters.sort_by,
            candidates = hotels.len(),
            matches = filtered.len(),
            "search recomputed"
        );

        filtered
    }

    // Text-only lookup used when choosing a hotel to review, first matches in catalog order
    pub fn pick(&self, hotels: &[Hotel], query: &str) -> Vec<Hotel> {
        hotels
            .iter()
            .filter(|hotel| matches_query(hotel, query))
            .take(self.config.picker_limit)
            .cloned()
            .collect()
    }

    fn passes_filters(hotel: &Hotel, filters: &SearchFilters) -> bool {
        // Non-positive thresholds count as unset
        let rating_ok = filters
            .min_rating
            .filter(|min| *min > 0.0)
            .map_or(true, |min| hotel.avg_wifi_rating >= min);

        // Hotels without distance data are never excluded here
        let distance_ok = filters
            .max_distance
            .filter(|max| *max > 0.0)
            .map_or(true, |max| hotel.distance.map_or(true, |d| d <= max));

        let price_ok = filters
            .price_range
            .as_ref()
            .filter(|tiers| !tiers.is_empty())
            .map_or(true, |tiers| tiers.contains(&hotel.price_range));

        rating_ok && distance_ok && price_ok
    }

    fn compare(a: &Hotel, b: &Hotel, sort_by: SortBy) -> Ordering {
        match sort_by {
            SortBy::Rating => b.avg_wifi_rating.total_cmp(&a.avg_wifi_rating),
            // Missing distance sorts as 0 km, ahead of every measured hotel
            SortBy::Distance => a
                .distance
                .unwrap_or(0.0)
                .total_cmp(&b.distance.unwrap_or(0.0)),
            SortBy::Reviews => b.num_reviews.cmp(&a.num_reviews),
        }
    }
}
