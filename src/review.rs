// Review authoring: the form draft, its validation and the hand-off to a consumer

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{Hotel, RatingLabel, SpeedTestResult};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("Please select a rating before submitting")]
    MissingRating,

    #[error("Rating must be between 1 and 5 stars, got {0}")]
    RatingOutOfRange(u8),

    #[error("Review rejected: {0}")]
    Rejected(String),
}

// Plain record handed to the submission consumer
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSubmission {
    pub rating: u8,
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_down: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_up: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping: Option<f64>,
}

// Short confirmation shown to the user after a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
}

// Form state as typed by the user. Speed fields stay raw text until submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewDraft {
    // 0 means no star selected yet
    pub rating: u8,
    pub comment: String,
    pub speed_down: String,
    pub speed_up: String,
    pub ping: String,
}

impl ReviewDraft {
    pub fn new() -> Self {
        Self::default()
    }

    // Start a draft with the latest speed-test measurement filled in
    pub fn prefilled(result: Option<&SpeedTestResult>) -> Self {
        let mut draft = Self::default();
        if let Some(result) = result {
            draft.apply_speed_test(result);
        }
        draft
    }

    pub fn apply_speed_test(&mut self, result: &SpeedTestResult) {
        self.speed_down = result.download_speed.to_string();
        self.speed_up = result.upload_speed.to_string();
        self.ping = result.ping.to_string();
    }

    pub fn set_rating(&mut self, stars: u8) {
        self.rating = stars;
    }

    pub fn rating_label(&self) -> Option<RatingLabel> {
        RatingLabel::for_stars(self.rating)
    }

    pub fn can_submit(&self) -> bool {
        (1..=5).contains(&self.rating)
    }

    // Validate the draft and build the record for the consumer
    pub fn submit(&self) -> Result<ReviewSubmission, ReviewError> {
        match self.rating {
            0 => return Err(ReviewError::MissingRating),
            r if r > 5 => return Err(ReviewError::RatingOutOfRange(r)),
            _ => {}
        }

        Ok(ReviewSubmission {
            rating: self.rating,
            comment: self.comment.clone(),
            speed_down: parse_optional_number(&self.speed_down),
            speed_up: parse_optional_number(&self.speed_up),
            ping: parse_optional_number(&self.ping),
        })
    }
}

// Empty, malformed or non-finite text is "no value"
pub fn parse_optional_number(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

// Receives finished reviews
#[async_trait]
pub trait ReviewConsumer: Send + Sync {
    async fn accept(
        &self,
        hotel: &Hotel,
        review: ReviewSubmission,
    ) -> Result<Notification, ReviewError>;
}

// Default consumer: nothing is stored, the user only gets a confirmation
#[derive(Debug, Default, Clone)]
pub struct ConfirmingConsumer;

#[async_trait]
impl ReviewConsumer for ConfirmingConsumer {
    async fn accept(
        &self,
        hotel: &Hotel,
        review: ReviewSubmission,
    ) -> Result<Notification, ReviewError> {
        info!(
            hotel_id = %hotel.id,
            rating = review.rating,
            has_speed_data = review.speed_down.is_some(),
            "review submitted"
        );

        Ok(Notification {
            title: "Review submitted!".to_string(),
            description: format!("Thank you for reviewing {}.", hotel.name),
        })
    }
}

// Validate `draft` and pass it on, logging rejected drafts
pub async fn submit_review<C: ReviewConsumer + ?Sized>(
    consumer: &C,
    hotel: &Hotel,
    draft: &ReviewDraft,
) -> Result<Notification, ReviewError> {
    let submission = draft.submit().map_err(|e| {
        warn!(hotel_id = %hotel.id, error = %e, "review not submitted");
        e
    })?;

    consumer.accept(hotel, submission).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use chrono::Utc;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingConsumer {
        received: Mutex<Vec<(String, ReviewSubmission)>>,
    }

    #[async_trait]
    impl ReviewConsumer for RecordingConsumer {
        async fn accept(
            &self,
            hotel: &Hotel,
            review: ReviewSubmission,
        ) -> Result<Notification, ReviewError> {
            self.received.lock().push((hotel.id.clone(), review));
            Ok(Notification {
                title: "ok".to_string(),
                description: String::new(),
            })
        }
    }

    fn berlin() -> Hotel {
        Catalog::sample().unwrap().hotel("1").cloned().unwrap()
    }

    #[test]
    fn test_missing_rating_is_rejected() {
        let draft = ReviewDraft {
            comment: "fast".to_string(),
            ..Default::default()
        };
        assert!(!draft.can_submit());
        assert_eq!(draft.submit(), Err(ReviewError::MissingRating));
    }

    #[test]
    fn test_rating_only_produces_empty_record() {
        let mut draft = ReviewDraft::new();
        draft.set_rating(3);

        let submission = draft.submit().unwrap();
        assert_eq!(
            submission,
            ReviewSubmission {
                rating: 3,
                comment: String::new(),
                speed_down: None,
                speed_up: None,
                ping: None,
            }
        );
        assert_eq!(draft.rating_label(), Some(RatingLabel::Good));
    }

    #[test]
    fn test_out_of_range_rating_is_rejected() {
        let draft = ReviewDraft {
            rating: 6,
            ..Default::default()
        };
        assert_eq!(draft.submit(), Err(ReviewError::RatingOutOfRange(6)));
    }

    #[test]
    fn test_malformed_numbers_become_no_value() {
        let draft = ReviewDraft {
            rating: 4,
            speed_down: " 150.5 ".to_string(),
            speed_up: "fast".to_string(),
            ping: "NaN".to_string(),
            ..Default::default()
        };

        let submission = draft.submit().unwrap();
        assert_eq!(submission.speed_down, Some(150.5));
        assert_eq!(submission.speed_up, None);
        assert_eq!(submission.ping, None);

        assert_eq!(parse_optional_number(""), None);
        assert_eq!(parse_optional_number("inf"), None);
        assert_eq!(parse_optional_number("12"), Some(12.0));
    }

    #[test]
    fn test_prefill_copies_speed_test_values() {
        let result = SpeedTestResult {
            download_speed: 87,
            upload_speed: 21,
            ping: 14,
            timestamp: Utc::now(),
        };

        let mut draft = ReviewDraft::prefilled(Some(&result));
        assert_eq!(draft.speed_down, "87");
        assert_eq!(draft.speed_up, "21");
        assert_eq!(draft.ping, "14");
        assert_eq!(ReviewDraft::prefilled(None), ReviewDraft::default());

        draft.set_rating(5);
        let submission = draft.submit().unwrap();
        assert_eq!(submission.speed_down, Some(87.0));
        assert_eq!(submission.ping, Some(14.0));
    }

    #[test]
    fn test_submission_serializes_camel_case() {
        let submission = ReviewSubmission {
            rating: 2,
            comment: "meh".to_string(),
            speed_down: Some(10.0),
            speed_up: None,
            ping: None,
        };
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["speedDown"], 10.0);
        assert!(json.get("speedUp").is_none());
        assert!(json.get("ping").is_none());

        let parsed: ReviewSubmission =
            serde_json::from_str(r#"{"rating":2,"comment":"meh","speedDown":10.0}"#).unwrap();
        assert_eq!(parsed, submission);
    }

    #[tokio::test]
    async fn test_confirming_consumer_names_the_hotel() {
        let draft = ReviewDraft {
            rating: 5,
            ..Default::default()
        };

        let notification = submit_review(&ConfirmingConsumer, &berlin(), &draft)
            .await
            .unwrap();
        assert_eq!(
            notification.description,
            "Thank you for reviewing Hotel Digital Plaza."
        );
    }

    #[tokio::test]
    async fn test_consumer_is_not_called_for_invalid_drafts() {
        let consumer = RecordingConsumer::default();

        let err = submit_review(&consumer, &berlin(), &ReviewDraft::new())
            .await
            .unwrap_err();
        assert_eq!(err, ReviewError::MissingRating);
        assert!(consumer.received.lock().is_empty());

        let draft = ReviewDraft {
            rating: 1,
            ..Default::default()
        };
        submit_review(&consumer, &berlin(), &draft).await.unwrap();
        let received = consumer.received.lock();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0, "1");
        assert_eq!(received[0].1.rating, 1);
    }
}
