use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use professional_cell::RatingSummary;

use crate::error::ReviewError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i32,
    pub comment: Option<String>,
}

impl CreateReviewRequest {
    pub const RATING_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

    pub fn validate(&self) -> Result<(), ReviewError> {
        if !Self::RATING_RANGE.contains(&self.rating) {
            return Err(ReviewError::InvalidRequest(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        Ok(())
    }
}

/// Reviews of one professional, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct ProfessionalReviews {
    pub professional_id: Uuid,
    pub reviews: Vec<Review>,
    #[serde(flatten)]
    pub rating: RatingSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_rating_bounds() {
        for rating in [1, 3, 5] {
            assert!(CreateReviewRequest { rating, comment: None }.validate().is_ok());
        }
        for rating in [0, 6, -1] {
            assert_matches!(
                CreateReviewRequest { rating, comment: None }.validate(),
                Err(ReviewError::InvalidRequest(_))
            );
        }
    }
}
