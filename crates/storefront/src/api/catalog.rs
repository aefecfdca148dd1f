//! Catalog endpoints: products and reviews.
//!
//! Successful reads are cached for the configured catalog TTL. Filtered
//! listings bypass the cache.

use opto_world_core::ProductId;
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::types::{Product, ProductQuery, Review, null_as_default};
use super::{ApiClient, ApiResponse, Auth};
use crate::error::Result;

#[derive(Deserialize)]
struct ProductsEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    products: Vec<Product>,
}

#[derive(Deserialize)]
struct ProductEnvelope {
    product: Product,
}

#[derive(Deserialize)]
struct ReviewsEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    reviews: Vec<Review>,
}

impl ApiClient {
    /// List products, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<ApiResponse<Vec<Product>>> {
        let cacheable = query.is_empty();
        if cacheable
            && let Some(CacheValue::Products(products)) =
                self.inner.catalog.get(&CacheKey::AllProducts).await
        {
            debug!("Cache hit for products");
            return Ok(ApiResponse::Success {
                data: products,
                message: None,
            });
        }

        let mut url = self.endpoint(&["products"])?;
        if !cacheable {
            url.query_pairs_mut().extend_pairs(query.pairs());
        }
        let request = self.request(Method::GET, url, Auth::Public)?;
        let response = self
            .execute::<ProductsEnvelope>(request)
            .await?
            .map(|e| e.products);

        if cacheable && let Some(products) = response.data() {
            self.inner
                .catalog
                .insert(CacheKey::AllProducts, CacheValue::Products(products.clone()))
                .await;
        }
        Ok(response)
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, or if a successful response
    /// has no product.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: &ProductId) -> Result<ApiResponse<Product>> {
        let key = CacheKey::Product(product_id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.catalog.get(&key).await {
            debug!("Cache hit for product");
            return Ok(ApiResponse::Success {
                data: *product,
                message: None,
            });
        }

        let url = self.endpoint(&["products", product_id.as_str()])?;
        let request = self.request(Method::GET, url, Auth::Public)?;
        let response = self
            .execute::<ProductEnvelope>(request)
            .await?
            .map(|e| e.product);

        if let Some(product) = response.data() {
            self.inner
                .catalog
                .insert(key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }
        Ok(response)
    }

    /// Reviews for a product.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn list_reviews(&self, product_id: &ProductId) -> Result<ApiResponse<Vec<Review>>> {
        let key = CacheKey::Reviews(product_id.clone());
        if let Some(CacheValue::Reviews(reviews)) = self.inner.catalog.get(&key).await {
            debug!("Cache hit for reviews");
            return Ok(ApiResponse::Success {
                data: reviews,
                message: None,
            });
        }

        let mut url = self.endpoint(&["reviews"])?;
        url.query_pairs_mut()
            .append_pair("productId", product_id.as_str());
        let request = self.request(Method::GET, url, Auth::Public)?;
        let response = self
            .execute::<ReviewsEnvelope>(request)
            .await?
            .map(|e| e.reviews);

        if let Some(reviews) = response.data() {
            self.inner
                .catalog
                .insert(key, CacheValue::Reviews(reviews.clone()))
                .await;
        }
        Ok(response)
    }
}
