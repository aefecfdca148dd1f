//! Back-office endpoints.
//!
//! Every call here sends the bearer token; the backend rejects it unless the
//! signed-in user is an admin.

use opto_world_core::{BookingId, BookingStatus, ContactId, ContactStatus, ProductId};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::forms::{BookingEnvelope, ContactEnvelope};
use super::types::{Booking, ContactMessage, null_as_default};
use super::{ApiClient, ApiResponse, Auth};
use crate::error::Result;

#[derive(Deserialize)]
struct BookingsEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    bookings: Vec<Booking>,
}

#[derive(Deserialize)]
struct ContactsEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    contacts: Vec<ContactMessage>,
}

/// An envelope whose payload is ignored.
#[derive(Deserialize)]
pub(super) struct Acknowledgement {}

#[derive(Serialize)]
struct StatusBody<S> {
    status: S,
}

impl ApiClient {
    /// Every eye test booking, newest first as the backend orders them.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self))]
    pub async fn list_bookings(&self) -> Result<ApiResponse<Vec<Booking>>> {
        let url = self.endpoint(&["bookings"])?;
        let request = self.request(Method::GET, url, Auth::Bearer)?;
        Ok(self
            .execute::<BookingsEnvelope>(request)
            .await?
            .map(|e| e.bookings))
    }

    /// Move a booking to `status`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(booking_id = %booking_id, status = status.as_str()))]
    pub async fn update_booking_status(
        &self,
        booking_id: &BookingId,
        status: BookingStatus,
    ) -> Result<ApiResponse<Option<Booking>>> {
        let url = self.endpoint(&["bookings", booking_id.as_str(), "status"])?;
        let request = self
            .request(Method::PATCH, url, Auth::Bearer)?
            .json(&StatusBody { status });
        Ok(self
            .execute::<BookingEnvelope>(request)
            .await?
            .map(|e| e.booking))
    }

    /// Delete a booking.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn delete_booking(&self, booking_id: &BookingId) -> Result<ApiResponse<()>> {
        let url = self.endpoint(&["bookings", booking_id.as_str()])?;
        let request = self.request(Method::DELETE, url, Auth::Bearer)?;
        Ok(self.execute::<Acknowledgement>(request).await?.map(|_| ()))
    }

    /// Every contact form message.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self))]
    pub async fn list_contacts(&self) -> Result<ApiResponse<Vec<ContactMessage>>> {
        let url = self.endpoint(&["contacts"])?;
        let request = self.request(Method::GET, url, Auth::Bearer)?;
        Ok(self
            .execute::<ContactsEnvelope>(request)
            .await?
            .map(|e| e.contacts))
    }

    /// Move a contact message to `status`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(contact_id = %contact_id, status = status.as_str()))]
    pub async fn update_contact_status(
        &self,
        contact_id: &ContactId,
        status: ContactStatus,
    ) -> Result<ApiResponse<Option<ContactMessage>>> {
        let url = self.endpoint(&["contacts", contact_id.as_str(), "status"])?;
        let request = self
            .request(Method::PATCH, url, Auth::Bearer)?
            .json(&StatusBody { status });
        Ok(self
            .execute::<ContactEnvelope>(request)
            .await?
            .map(|e| e.contact))
    }

    /// Delete a contact message.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(contact_id = %contact_id))]
    pub async fn delete_contact(&self, contact_id: &ContactId) -> Result<ApiResponse<()>> {
        let url = self.endpoint(&["contacts", contact_id.as_str()])?;
        let request = self.request(Method::DELETE, url, Auth::Bearer)?;
        Ok(self.execute::<Acknowledgement>(request).await?.map(|_| ()))
    }

    /// Remove a product from the catalog.
    ///
    /// On success every cached catalog read is dropped, since listings and
    /// review pages may still mention the product.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn delete_product(&self, product_id: &ProductId) -> Result<ApiResponse<()>> {
        let url = self.endpoint(&["products", product_id.as_str()])?;
        let request = self.request(Method::DELETE, url, Auth::Bearer)?;
        let response = self.execute::<Acknowledgement>(request).await?.map(|_| ());
        if response.is_success() {
            info!("Product deleted; dropping cached catalog");
            self.invalidate_catalog();
        }
        Ok(response)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::testing;

    #[tokio::test]
    async fn test_list_bookings_with_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/bookings"))
            .and(header("authorization", "Bearer admin-tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "bookings": [{
                    "_id": "b1",
                    "name": "Asha Rao",
                    "email": "asha@example.com",
                    "phone": "9876543210",
                    "location": "Koramangala",
                    "testType": "comprehensive",
                    "preferredDate": "2026-11-02T00:00:00.000Z",
                    "preferredTime": "10:30 AM",
                    "status": "pending"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = testing::signed_in_client(&server.uri(), "admin-tok");
        let bookings = client.list_bookings().await.unwrap().into_result().unwrap();

        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].name, "Asha Rao");
        assert_eq!(bookings[0].test_type.as_deref(), Some("comprehensive"));
        assert_eq!(bookings[0].status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn test_update_booking_status_sends_patch() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/api/bookings/b1/status"))
            .and(header("authorization", "Bearer admin-tok"))
            .and(body_json(json!({"status": "confirmed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Booking status updated",
                "booking": {"_id": "b1", "status": "confirmed"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = testing::signed_in_client(&server.uri(), "admin-tok");
        let booking = client
            .update_booking_status(&BookingId::new("b1"), BookingStatus::Confirmed)
            .await
            .unwrap()
            .into_result()
            .unwrap()
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_non_admin_is_refused() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/bookings/b1"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "success": false,
                "message": "Access denied. Admin only."
            })))
            .mount(&server)
            .await;

        let client = testing::signed_in_client(&server.uri(), "user-tok");
        let failure = client
            .delete_booking(&BookingId::new("b1"))
            .await
            .unwrap()
            .into_result()
            .unwrap_err();
        assert_eq!(failure.status, 403);
        assert_eq!(failure.message, "Access denied. Admin only.");
    }

    #[tokio::test]
    async fn test_contacts_listing_and_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/contacts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "contacts": [{
                    "_id": "c1",
                    "name": "Ravi",
                    "email": "ravi@example.com",
                    "subject": "Frame repair",
                    "message": "My hinge is loose.",
                    "status": "new"
                }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/contacts/c1/status"))
            .and(body_json(json!({"status": "archived"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/contacts/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Contact deleted"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = testing::signed_in_client(&server.uri(), "admin-tok");
        let contacts = client.list_contacts().await.unwrap().into_result().unwrap();
        assert_eq!(contacts[0].subject, "Frame repair");
        assert_eq!(contacts[0].status, ContactStatus::New);

        let updated = client
            .update_contact_status(&contacts[0].id, ContactStatus::Archived)
            .await
            .unwrap();
        assert_eq!(updated.data(), Some(&None));

        let deleted = client.delete_contact(&contacts[0].id).await.unwrap();
        assert_eq!(deleted.message(), Some("Contact deleted"));
    }

    #[tokio::test]
    async fn test_delete_product_invalidates_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "product": {"_id": "p1", "name": "Classic Aviator Gold", "price": 2499}
            })))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/products/p1"))
            .and(header("authorization", "Bearer admin-tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "Product deleted"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = testing::signed_in_client(&server.uri(), "admin-tok");
        let id = ProductId::new("p1");
        client.get_product(&id).await.unwrap();
        client.get_product(&id).await.unwrap();
        assert!(client.delete_product(&id).await.unwrap().is_success());
        client.get_product(&id).await.unwrap();
    }

    #[tokio::test]
    async fn test_refused_delete_keeps_catalog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "product": {"_id": "p1", "name": "Classic Aviator Gold", "price": 2499}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/products/p1"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "success": false,
                "message": "Not authorized"
            })))
            .mount(&server)
            .await;

        let client = testing::client(&server.uri());
        let id = ProductId::new("p1");
        client.get_product(&id).await.unwrap();
        assert!(!client.delete_product(&id).await.unwrap().is_success());
        client.get_product(&id).await.unwrap();
    }
}
