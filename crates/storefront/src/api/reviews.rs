//! Review writes.
//!
//! Reads live with the rest of the catalog. A write changes a product's
//! rating and review count, so cached catalog entries are dropped after it.

use opto_world_core::{ProductId, ReviewId};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::admin::Acknowledgement;
use super::cache::CacheKey;
use super::types::Review;
use super::{ApiClient, ApiResponse, Auth};
use crate::error::Result;

#[derive(Deserialize)]
struct ReviewEnvelope {
    #[serde(default)]
    review: Option<Review>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    product_id: Option<&'a ProductId>,
    rating: u8,
    comment: &'a str,
}

impl ApiClient {
    /// Fetch one review.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(review_id = %review_id))]
    pub async fn get_review(&self, review_id: &ReviewId) -> Result<ApiResponse<Option<Review>>> {
        let url = self.endpoint(&["reviews", review_id.as_str()])?;
        let request = self.request(Method::GET, url, Auth::Public)?;
        Ok(self
            .execute::<ReviewEnvelope>(request)
            .await?
            .map(|e| e.review))
    }

    /// Review a product as the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self, comment), fields(product_id = %product_id))]
    pub async fn create_review(
        &self,
        product_id: &ProductId,
        rating: u8,
        comment: &str,
    ) -> Result<ApiResponse<Option<Review>>> {
        let url = self.endpoint(&["reviews"])?;
        let request = self
            .request(Method::POST, url, Auth::Bearer)?
            .json(&ReviewBody {
                product_id: Some(product_id),
                rating,
                comment,
            });
        let response = self
            .execute::<ReviewEnvelope>(request)
            .await?
            .map(|e| e.review);

        if response.is_success() {
            let catalog = &self.inner.catalog;
            catalog.invalidate(&CacheKey::Reviews(product_id.clone())).await;
            catalog.invalidate(&CacheKey::Product(product_id.clone())).await;
            catalog.invalidate(&CacheKey::AllProducts).await;
        }
        Ok(response)
    }

    /// Change the rating and comment of one of the user's reviews.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self, comment), fields(review_id = %review_id))]
    pub async fn update_review(
        &self,
        review_id: &ReviewId,
        rating: u8,
        comment: &str,
    ) -> Result<ApiResponse<Option<Review>>> {
        let url = self.endpoint(&["reviews", review_id.as_str()])?;
        let request = self
            .request(Method::PUT, url, Auth::Bearer)?
            .json(&ReviewBody {
                product_id: None,
                rating,
                comment,
            });
        let response = self
            .execute::<ReviewEnvelope>(request)
            .await?
            .map(|e| e.review);
        if response.is_success() {
            self.invalidate_catalog();
        }
        Ok(response)
    }

    /// Delete one of the user's reviews.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(review_id = %review_id))]
    pub async fn delete_review(&self, review_id: &ReviewId) -> Result<ApiResponse<()>> {
        let url = self.endpoint(&["reviews", review_id.as_str()])?;
        let request = self.request(Method::DELETE, url, Auth::Bearer)?;
        let response = self.execute::<Acknowledgement>(request).await?.map(|_| ());
        if response.is_success() {
            self.invalidate_catalog();
        }
        Ok(response)
    }

    /// Count a vote that a review was helpful. No sign-in needed.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(review_id = %review_id))]
    pub async fn mark_review_helpful(
        &self,
        review_id: &ReviewId,
    ) -> Result<ApiResponse<Option<Review>>> {
        let url = self.endpoint(&["reviews", review_id.as_str(), "helpful"])?;
        let request = self.request(Method::PUT, url, Auth::Public)?;
        let response = self
            .execute::<ReviewEnvelope>(request)
            .await?
            .map(|e| e.review);
        if response.is_success() {
            self.invalidate_catalog();
        }
        Ok(response)
    }
}
