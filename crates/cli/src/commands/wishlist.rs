//! Wishlist commands.

use opto_world_core::ProductId;
use opto_world_storefront::Storefront;

use super::{CommandError, accepted};
use crate::output;

/// Fetch and show the wishlist.
pub async fn show(shop: &Storefront) -> Result<(), CommandError> {
    let result = accepted(shop.wishlist().refresh().await?)?;
    if let Some(wishlist) = result.data {
        output::print(&output::wishlist(&wishlist));
    }
    Ok(())
}

/// Add a product.
pub async fn add(shop: &Storefront, id: &str) -> Result<(), CommandError> {
    let result = accepted(shop.wishlist().add(&ProductId::new(id)).await?)?;
    output::print(result.message.as_deref().unwrap_or("Added to wishlist"));
    Ok(())
}

/// Remove a product.
pub async fn remove(shop: &Storefront, id: &str) -> Result<(), CommandError> {
    let result = accepted(shop.wishlist().remove(&ProductId::new(id)).await?)?;
    output::print(result.message.as_deref().unwrap_or("Removed from wishlist"));
    Ok(())
}

/// Empty the wishlist.
pub async fn clear(shop: &Storefront) -> Result<(), CommandError> {
    let result = accepted(shop.wishlist().clear().await?)?;
    output::print(result.message.as_deref().unwrap_or("Wishlist cleared"));
    Ok(())
}

/// Print `yes` or `no`.
pub async fn has(shop: &Storefront, id: &str) -> Result<(), CommandError> {
    accepted(shop.wishlist().refresh().await?)?;
    let member = shop.wishlist().is_member(&ProductId::new(id));
    output::print(if member { "yes" } else { "no" });
    Ok(())
}
