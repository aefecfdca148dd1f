//! Back-office commands.
//!
//! # Usage
//!
//! ```bash
//! ow-cli admin bookings
//! ow-cli admin booking-status 665f1c2e9b1d4a0012345678 confirmed
//! ow-cli admin contacts
//! ow-cli admin delete-product 665f1c2e9b1d4a0012345678
//! ```
//!
//! The stored profile must carry the admin role. The backend checks the
//! token as well; the local check only saves a round trip.

use opto_world_core::{BookingId, BookingStatus, ContactId, ContactStatus, ProductId};
use opto_world_storefront::{SessionProfile, Storefront};
use secrecy::SecretString;

use super::CommandError;
use crate::output;

/// List every booking.
pub async fn bookings(shop: &Storefront) -> Result<(), CommandError> {
    require_admin(shop)?;
    let bookings = shop.api().list_bookings().await?.into_result()?;
    output::print(&output::bookings(&bookings));
    Ok(())
}

/// Move a booking to a new status.
pub async fn booking_status(shop: &Storefront, id: &str, status: &str) -> Result<(), CommandError> {
    let status = status
        .trim()
        .parse::<BookingStatus>()
        .map_err(|e| CommandError::Invalid {
            field: "status",
            reason: e.to_string(),
        })?;
    require_admin(shop)?;
    shop.api()
        .update_booking_status(&BookingId::new(id), status)
        .await?
        .into_result()?;
    output::print(&format!("Booking {id} is now {status}"));
    Ok(())
}

/// Delete a booking.
pub async fn delete_booking(shop: &Storefront, id: &str) -> Result<(), CommandError> {
    require_admin(shop)?;
    shop.api()
        .delete_booking(&BookingId::new(id))
        .await?
        .into_result()?;
    output::print(&format!("Booking {id} deleted"));
    Ok(())
}

/// List every contact message.
pub async fn contacts(shop: &Storefront) -> Result<(), CommandError> {
    require_admin(shop)?;
    let contacts = shop.api().list_contacts().await?.into_result()?;
    output::print(&output::contacts(&contacts));
    Ok(())
}

/// Move a contact message to a new status.
pub async fn contact_status(shop: &Storefront, id: &str, status: &str) -> Result<(), CommandError> {
    let status = status
        .trim()
        .parse::<ContactStatus>()
        .map_err(|e| CommandError::Invalid {
            field: "status",
            reason: e.to_string(),
        })?;
    require_admin(shop)?;
    shop.api()
        .update_contact_status(&ContactId::new(id), status)
        .await?
        .into_result()?;
    output::print(&format!("Message {id} is now {status}"));
    Ok(())
}

/// Delete a contact message.
pub async fn delete_contact(shop: &Storefront, id: &str) -> Result<(), CommandError> {
    require_admin(shop)?;
    shop.api()
        .delete_contact(&ContactId::new(id))
        .await?
        .into_result()?;
    output::print(&format!("Message {id} deleted"));
    Ok(())
}

/// Remove a product from the catalog.
pub async fn delete_product(shop: &Storefront, id: &str) -> Result<(), CommandError> {
    require_admin(shop)?;
    shop.api()
        .delete_product(&ProductId::new(id))
        .await?
        .into_result()?;
    output::print(&format!("Product {id} deleted"));
    Ok(())
}

/// Create another admin account without leaving the current session.
pub async fn signup(
    shop: &Storefront,
    name: &str,
    email: &str,
    password: String,
    confirm_password: String,
) -> Result<(), CommandError> {
    require_admin(shop)?;
    let password = SecretString::from(password);
    let confirm_password = SecretString::from(confirm_password);
    let user = shop
        .api()
        .admin_signup(name, email, &password, &confirm_password)
        .await?
        .into_result()?;
    tracing::info!(email = %user.email, "Admin account created");
    output::print(&format!("Created admin {} <{}>", user.name, user.email));
    Ok(())
}

fn require_admin(shop: &Storefront) -> Result<(), CommandError> {
    let session = shop.session();
    admin_only(session.is_authenticated(), &session.profile()?)
}

fn admin_only(authenticated: bool, profile: &SessionProfile) -> Result<(), CommandError> {
    if !authenticated {
        return Err(CommandError::Store(
            "Please login as an admin (run `ow-cli login` first)".to_string(),
        ));
    }
    if !profile.role.is_admin() {
        return Err(CommandError::Store("Admin access required".to_string()));
    }
    Ok(())
}
