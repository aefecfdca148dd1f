//! Contact and booking submissions.

use reqwest::Method;
use serde::Deserialize;
use tracing::instrument;

use super::types::{Booking, BookingRequest, ContactMessage, ContactRequest};
use super::{ApiClient, ApiResponse, Auth};
use crate::error::Result;

#[derive(Deserialize)]
pub(super) struct ContactEnvelope {
    #[serde(default)]
    pub(super) contact: Option<ContactMessage>,
}

#[derive(Deserialize)]
pub(super) struct BookingEnvelope {
    #[serde(default)]
    pub(super) booking: Option<Booking>,
}

impl ApiClient {
    /// Send a contact form message.
    ///
    /// The stored message is returned when the backend echoes it.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self, contact), fields(subject = %contact.subject))]
    pub async fn create_contact(
        &self,
        contact: &ContactRequest,
    ) -> Result<ApiResponse<Option<ContactMessage>>> {
        let url = self.endpoint(&["contacts"])?;
        let request = self.request(Method::POST, url, Auth::Public)?.json(contact);
        Ok(self
            .execute::<ContactEnvelope>(request)
            .await?
            .map(|e| e.contact))
    }

    /// Request an eye test appointment.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(
        skip(self, booking),
        fields(test_type = booking.test_type.as_str(), date = %booking.preferred_date)
    )]
    pub async fn create_booking(
        &self,
        booking: &BookingRequest,
    ) -> Result<ApiResponse<Option<Booking>>> {
        let url = self.endpoint(&["bookings"])?;
        let request = self.request(Method::POST, url, Auth::Public)?.json(booking);
        Ok(self
            .execute::<BookingEnvelope>(request)
            .await?
            .map(|e| e.booking))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;
    use opto_world_core::{BookingStatus, Email};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::types::EyeTestService;
    use crate::api::testing;

    #[tokio::test]
    async fn test_contact_message_and_acknowledgement() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/contacts"))
            .and(body_partial_json(json!({"subject": "Frame repair"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "message": "Thanks, we'll be in touch"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = testing::client(&server.uri());
        let response = client
            .create_contact(&ContactRequest {
                name: "Asha Rao".to_string(),
                email: Email::parse("asha@example.com").unwrap(),
                phone: None,
                subject: "Frame repair".to_string(),
                message: "My hinge is loose.".to_string(),
            })
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(response.message(), Some("Thanks, we'll be in touch"));
        assert_eq!(response.data(), Some(&None));
    }

    #[tokio::test]
    async fn test_booking_echo() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/bookings"))
            .and(body_partial_json(json!({
                "testType": "comprehensive",
                "preferredDate": "2026-11-02",
                "preferredTime": "09:00"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "success": true,
                "message": "Booking created",
                "booking": {"_id": "b1", "status": "pending", "preferredDate": "2026-11-02"}
            })))
            .mount(&server)
            .await;

        let client = testing::client(&server.uri());
        let booking = client
            .create_booking(&BookingRequest {
                name: "Asha Rao".to_string(),
                email: Email::parse("asha@example.com").unwrap(),
                phone: "+91 98765 43210".to_string(),
                location: "banashankari".to_string(),
                test_type: EyeTestService::Comprehensive,
                preferred_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
                preferred_time: "09:00".to_string(),
                message: Some("First visit".to_string()),
            })
            .await
            .unwrap()
            .into_result()
            .unwrap()
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.id.as_str(), "b1");
    }
}
