//! Product reviews and their aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{ProductId, ReviewId};
use crate::validation::ValidationErrors;

/// A star rating from 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Returns `None` unless `stars` is within `1..=5`.
    #[must_use]
    pub const fn new(stars: u8) -> Option<Self> {
        if stars >= Self::MIN && stars <= Self::MAX {
            Some(Self(stars))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn stars(self) -> u8 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stars = u8::deserialize(deserializer)?;
        Self::new(stars)
            .ok_or_else(|| serde::de::Error::custom(format!("rating must be 1-5 (got {stars})")))
    }
}

/// Unvalidated review input, as typed into the review form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDraft {
    pub product_id: ProductId,
    pub product_name: String,
    /// Raw star count; `0` means nothing was selected.
    pub rating: u8,
    pub comment: String,
}

impl ReviewDraft {
    /// Validate into a [`Review`] stamped with `now`.
    ///
    /// # Errors
    ///
    /// Returns every failing field: `rating` outside 1-5, or a `comment` that
    /// is empty after trimming.
    pub fn validate(self, now: DateTime<Utc>) -> Result<Review, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let rating = Rating::new(self.rating);
        if rating.is_none() {
            errors.add("rating", "Please select a rating between 1 and 5");
        }
        let comment = self.comment.trim();
        if comment.is_empty() {
            errors.add("comment", "Please write a comment");
        }

        match rating {
            Some(rating) if errors.is_empty() => Ok(Review {
                id: ReviewId::generate(),
                product_id: self.product_id,
                product_name: self.product_name,
                rating,
                comment: comment.to_owned(),
                created_at: now,
            }),
            _ => Err(errors),
        }
    }
}

/// A submitted review. Never edited or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub product_name: String,
    pub rating: Rating,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Aggregate rating of one product.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub count: usize,
    /// Arithmetic mean of the ratings; `None` without reviews.
    pub average: Option<f64>,
}

impl ReviewSummary {
    /// Aggregate the reviews of `product_id` among `reviews`.
    #[must_use]
    pub fn for_product<'a>(
        product_id: &ProductId,
        reviews: impl IntoIterator<Item = &'a Review>,
    ) -> Self {
        let (count, sum) = reviews
            .into_iter()
            .filter(|r| &r.product_id == product_id)
            .fold((0_usize, 0_u32), |(n, s), r| (n + 1, s + u32::from(r.rating.stars())));

        #[allow(clippy::cast_precision_loss)]
        let average = (count > 0).then(|| f64::from(sum) / count as f64);
        Self { count, average }
    }
}
