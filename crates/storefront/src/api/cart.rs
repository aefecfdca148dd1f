//! Cart endpoints.

use opto_world_core::ProductId;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::types::{CartSnapshot, null_as_default};
use super::{ApiClient, ApiResponse, Auth};
use crate::error::Result;

#[derive(Deserialize)]
struct CartEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    cart: CartSnapshot,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddToCartBody<'a> {
    product_id: &'a ProductId,
    quantity: u32,
}

#[derive(Serialize)]
struct QuantityBody {
    quantity: u32,
}

impl ApiClient {
    /// Fetch the signed-in user's cart.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<ApiResponse<CartSnapshot>> {
        let url = self.endpoint(&["cart"])?;
        let request = self.request(Method::GET, url, Auth::Bearer)?;
        Ok(self.execute::<CartEnvelope>(request).await?.map(|e| e.cart))
    }

    /// Add `quantity` units of a product.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<ApiResponse<CartSnapshot>> {
        let url = self.endpoint(&["cart", "add"])?;
        let request = self
            .request(Method::POST, url, Auth::Bearer)?
            .json(&AddToCartBody {
                product_id,
                quantity,
            });
        Ok(self.execute::<CartEnvelope>(request).await?.map(|e| e.cart))
    }

    /// Set the quantity of a line.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_cart_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<ApiResponse<CartSnapshot>> {
        let url = self.endpoint(&["cart", "update", product_id.as_str()])?;
        let request = self
            .request(Method::PUT, url, Auth::Bearer)?
            .json(&QuantityBody { quantity });
        Ok(self.execute::<CartEnvelope>(request).await?.map(|e| e.cart))
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_cart_item(
        &self,
        product_id: &ProductId,
    ) -> Result<ApiResponse<CartSnapshot>> {
        let url = self.endpoint(&["cart", "remove", product_id.as_str()])?;
        let request = self.request(Method::DELETE, url, Auth::Bearer)?;
        Ok(self.execute::<CartEnvelope>(request).await?.map(|e| e.cart))
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<ApiResponse<CartSnapshot>> {
        let url = self.endpoint(&["cart", "clear"])?;
        let request = self.request(Method::DELETE, url, Auth::Bearer)?;
        Ok(self.execute::<CartEnvelope>(request).await?.map(|e| e.cart))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::testing;
    use crate::error::ClientError;

    fn cart_json(total_items: u32, total_price: u32) -> serde_json::Value {
        json!({
            "success": true,
            "cart": {
                "items": [{
                    "product": {"_id": "p1", "name": "Classic Aviator Gold", "stock": 10},
                    "quantity": total_items,
                    "price": 2499
                }],
                "totalItems": total_items,
                "totalPrice": total_price
            }
        })
    }

    #[tokio::test]
    async fn test_get_cart_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_json(3, 7497)))
            .expect(1)
            .mount(&server)
            .await;

        let client = testing::signed_in_client(&server.uri(), "tok-1");
        let cart = client.get_cart().await.unwrap().into_result().unwrap();
        assert_eq!(cart.total_items, 3);
        assert_eq!(cart.total_price, Decimal::from(7497));
    }

    #[tokio::test]
    async fn test_add_to_cart_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/cart/add"))
            .and(body_json(json!({"productId": "p1", "quantity": 2})))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_json(2, 4998)))
            .expect(1)
            .mount(&server)
            .await;

        let client = testing::signed_in_client(&server.uri(), "tok-1");
        let response = client.add_to_cart(&ProductId::new("p1"), 2).await.unwrap();
        assert_eq!(response.data().unwrap().total_items, 2);
    }

    #[tokio::test]
    async fn test_update_and_remove_paths() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/cart/update/p1"))
            .and(body_json(json!({"quantity": 5})))
            .respond_with(ResponseTemplate::new(200).set_body_json(cart_json(5, 12495)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/cart/remove/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "cart": {"items": [], "totalItems": 0, "totalPrice": 0}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = testing::signed_in_client(&server.uri(), "tok-1");
        let id = ProductId::new("p1");
        assert!(client.update_cart_item(&id, 5).await.unwrap().is_success());
        let cart = client.remove_cart_item(&id).await.unwrap().into_result().unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_clear_cart_without_payload_defaults_to_empty() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/cart/clear"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;

        let client = testing::signed_in_client(&server.uri(), "tok-1");
        let cart = client.clear_cart().await.unwrap().into_result().unwrap();
        assert_eq!(cart, CartSnapshot::default());
    }

    #[tokio::test]
    async fn test_stock_refusal_is_logical_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/cart/add"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "message": "Only 2 items available in stock"
            })))
            .mount(&server)
            .await;

        let client = testing::signed_in_client(&server.uri(), "tok-1");
        let failure = client
            .add_to_cart(&ProductId::new("p1"), 5)
            .await
            .unwrap()
            .into_result()
            .unwrap_err();
        assert_eq!(failure.status, 400);
        assert_eq!(failure.message, "Only 2 items available in stock");
    }

    #[tokio::test]
    async fn test_html_error_page_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/cart"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&server)
            .await;

        let client = testing::signed_in_client(&server.uri(), "tok-1");
        let err = client.get_cart().await.unwrap_err();
        assert!(matches!(err, ClientError::UnexpectedStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let client = testing::signed_in_client(&uri, "tok-1");
        let err = client.get_cart().await.unwrap_err();
        assert!(matches!(err, ClientError::Http(_)));
    }
}
