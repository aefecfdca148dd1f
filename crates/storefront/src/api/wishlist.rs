//! Wishlist endpoints.

use opto_world_core::ProductId;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::types::{WishlistSnapshot, null_as_default};
use super::{ApiClient, ApiResponse, Auth};
use crate::error::Result;

#[derive(Deserialize)]
struct WishlistEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    wishlist: WishlistSnapshot,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddToWishlistBody<'a> {
    product_id: &'a ProductId,
}

impl ApiClient {
    /// Fetch the signed-in user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self))]
    pub async fn get_wishlist(&self) -> Result<ApiResponse<WishlistSnapshot>> {
        let url = self.endpoint(&["wishlist"])?;
        let request = self.request(Method::GET, url, Auth::Bearer)?;
        Ok(self
            .execute::<WishlistEnvelope>(request)
            .await?
            .map(|e| e.wishlist))
    }

    /// Add a product.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_wishlist(
        &self,
        product_id: &ProductId,
    ) -> Result<ApiResponse<WishlistSnapshot>> {
        let url = self.endpoint(&["wishlist", "add"])?;
        let request = self
            .request(Method::POST, url, Auth::Bearer)?
            .json(&AddToWishlistBody { product_id });
        Ok(self
            .execute::<WishlistEnvelope>(request)
            .await?
            .map(|e| e.wishlist))
    }

    /// Remove a product.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_wishlist(
        &self,
        product_id: &ProductId,
    ) -> Result<ApiResponse<WishlistSnapshot>> {
        let url = self.endpoint(&["wishlist", "remove", product_id.as_str()])?;
        let request = self.request(Method::DELETE, url, Auth::Bearer)?;
        Ok(self
            .execute::<WishlistEnvelope>(request)
            .await?
            .map(|e| e.wishlist))
    }

    /// Remove every product.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self))]
    pub async fn clear_wishlist(&self) -> Result<ApiResponse<WishlistSnapshot>> {
        let url = self.endpoint(&["wishlist", "clear"])?;
        let request = self.request(Method::DELETE, url, Auth::Bearer)?;
        Ok(self
            .execute::<WishlistEnvelope>(request)
            .await?
            .map(|e| e.wishlist))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::testing;

    #[tokio::test]
    async fn test_add_to_wishlist_decodes_mixed_items() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/wishlist/add"))
            .and(body_json(json!({"productId": "p2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "wishlist": {"items": [{"_id": "p1", "name": "Classic Aviator Gold"}, "p2"]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = testing::signed_in_client(&server.uri(), "tok-1");
        let wishlist = client
            .add_to_wishlist(&ProductId::new("p2"))
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(wishlist.len(), 2);
        assert!(wishlist.contains(&ProductId::new("p2")));
    }

    #[tokio::test]
    async fn test_remove_missing_item_is_logical_failure() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/wishlist/remove/p9"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "success": false,
                "message": "Product not in wishlist"
            })))
            .mount(&server)
            .await;

        let client = testing::signed_in_client(&server.uri(), "tok-1");
        let response = client.remove_from_wishlist(&ProductId::new("p9")).await.unwrap();
        assert_eq!(response.message(), Some("Product not in wishlist"));
    }

    #[tokio::test]
    async fn test_get_and_clear() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/wishlist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "wishlist": {"items": ["p1"]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/wishlist/clear"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "wishlist": null
            })))
            .mount(&server)
            .await;

        let client = testing::signed_in_client(&server.uri(), "tok-1");
        assert_eq!(client.get_wishlist().await.unwrap().data().unwrap().len(), 1);
        assert!(client.clear_wishlist().await.unwrap().data().unwrap().is_empty());
    }
}
