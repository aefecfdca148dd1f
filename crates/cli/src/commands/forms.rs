//! Eye test bookings and contact enquiries.

use chrono::NaiveDate;
use opto_world_core::Email;
use opto_world_storefront::Storefront;
use opto_world_storefront::api::{BookingRequest, ContactRequest, EyeTestService};

use super::CommandError;
use crate::output;

/// Raw booking arguments.
pub struct BookingForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub test_type: String,
    pub date: String,
    pub time: String,
    pub message: Option<String>,
}

/// Raw contact arguments.
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

/// List the bookable eye tests with their fees.
pub fn services() {
    for service in EyeTestService::ALL {
        output::print(&format!(
            "{:<14} {:<28} {}",
            service.as_str(),
            service.label(),
            service.fee().display()
        ));
    }
}

/// Submit a booking.
pub async fn book(shop: &Storefront, form: BookingForm) -> Result<(), CommandError> {
    let request = booking_request(form)?;
    let fee = request.test_type.fee();
    let booking = shop.api().create_booking(&request).await?.into_result()?;

    match booking {
        Some(booking) => output::print(&format!(
            "Booking {} is {} ({} payable at the store)",
            booking.id, booking.status, fee
        )),
        None => output::print("Booking received"),
    }
    Ok(())
}

/// Submit an enquiry.
pub async fn contact(shop: &Storefront, form: ContactForm) -> Result<(), CommandError> {
    let request = ContactRequest {
        name: required("name", form.name)?,
        email: parse_email(&form.email)?,
        phone: form.phone.filter(|p| !p.trim().is_empty()),
        subject: required("subject", form.subject)?,
        message: required("message", form.message)?,
    };
    shop.api().create_contact(&request).await?.into_result()?;
    output::print("Thanks! We'll get back to you soon.");
    Ok(())
}

fn booking_request(form: BookingForm) -> Result<BookingRequest, CommandError> {
    let test_type = form
        .test_type
        .trim()
        .parse::<EyeTestService>()
        .map_err(|e| CommandError::Invalid {
            field: "test type",
            reason: e.to_string(),
        })?;
    let preferred_date = NaiveDate::parse_from_str(form.date.trim(), "%Y-%m-%d").map_err(|e| {
        CommandError::Invalid {
            field: "date",
            reason: e.to_string(),
        }
    })?;

    Ok(BookingRequest {
        name: required("name", form.name)?,
        email: parse_email(&form.email)?,
        phone: required("phone", form.phone)?,
        location: required("location", form.location)?,
        test_type,
        preferred_date,
        preferred_time: required("time", form.time)?,
        message: form.message.filter(|m| !m.trim().is_empty()),
    })
}

fn parse_email(raw: &str) -> Result<Email, CommandError> {
    Email::parse(raw).map_err(|e| CommandError::Invalid {
        field: "email",
        reason: e.to_string(),
    })
}

fn required(field: &'static str, value: String) -> Result<String, CommandError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CommandError::Invalid {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}
