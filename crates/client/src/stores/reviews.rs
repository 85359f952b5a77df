//! Product reviews in the session tier, and summaries across every identity.

use chrono::{DateTime, Utc};
use comfycart_core::{ProductId, Review, ReviewDraft, ReviewSummary};

use super::keys;
use crate::error::{ReviewError, StorageError};
use crate::session::SessionService;
use crate::storage::{read_json, write_json};

/// Reviews written by the current identity, in the session tier.
///
/// Reading a product's rating looks across every identity's reviews.
#[derive(Clone)]
pub struct ReviewStore {
    session: SessionService,
}

impl ReviewStore {
    #[must_use]
    pub const fn new(session: SessionService) -> Self {
        Self { session }
    }

    fn key(&self) -> Result<String, StorageError> {
        Ok(self.session.resolve()?.namespaced(keys::REVIEWS))
    }

    /// The current identity's reviews, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn reviews(&self) -> Result<Vec<Review>, StorageError> {
        read_json(self.session.session(), &self.key()?)
    }

    /// Validate and append a review.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::Invalid` for a rating outside 1-5 or a blank
    /// comment (nothing is stored), or a storage error.
    pub fn add(&self, draft: ReviewDraft, now: DateTime<Utc>) -> Result<Review, ReviewError> {
        let review = draft.validate(now)?;
        let key = self.key()?;
        let mut reviews: Vec<Review> = read_json(self.session.session(), &key)?;
        reviews.push(review.clone());
        write_json(self.session.session(), &key, &reviews)?;
        tracing::debug!(product_id = %review.product_id, "Review added");
        Ok(review)
    }

    /// The newest `n` reviews of the current identity, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn recent(&self, n: usize) -> Result<Vec<Review>, StorageError> {
        let mut reviews = self.reviews()?;
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reviews.truncate(n);
        Ok(reviews)
    }

    /// Rating of `product_id` across every identity's reviews.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn summary(&self, product_id: &ProductId) -> Result<ReviewSummary, StorageError> {
        let tier = self.session.session();
        let prefix = format!("{}_", keys::REVIEWS);
        let mut all = Vec::new();
        for key in tier.keys()?.into_iter().filter(|k| k.starts_with(&prefix)) {
            let reviews: Vec<Review> = read_json(tier, &key)?;
            all.extend(reviews);
        }
        Ok(ReviewSummary::for_product(product_id, &all))
    }
}
