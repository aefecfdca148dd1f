//! Cart commands.

use opto_world_core::ProductId;
use opto_world_storefront::Storefront;

use super::{CommandError, accepted};
use crate::output;

/// Fetch and show the cart.
pub async fn show(shop: &Storefront) -> Result<(), CommandError> {
    let result = accepted(shop.cart().refresh().await?)?;
    if let Some(cart) = result.data {
        output::print(&output::cart(&cart));
    }
    Ok(())
}

/// Add `quantity` of a product.
pub async fn add(shop: &Storefront, id: &str, quantity: u32) -> Result<(), CommandError> {
    let id = ProductId::new(id);
    // Load the cart first so the stock check sees the current line.
    accepted(shop.cart().refresh().await?)?;
    report(accepted(shop.cart().add_item(&id, quantity).await?)?.message);
    output::print(&format!("Cart: {} items", shop.cart().count()));
    Ok(())
}

/// Set a line's quantity.
pub async fn update(shop: &Storefront, id: &str, quantity: u32) -> Result<(), CommandError> {
    let id = ProductId::new(id);
    accepted(shop.cart().refresh().await?)?;
    let result = accepted(shop.cart().update_quantity(&id, quantity).await?)?;
    report(result.message);
    if let Some(cart) = result.data {
        output::print(&output::cart(&cart));
    }
    Ok(())
}

/// Remove a product.
pub async fn remove(shop: &Storefront, id: &str) -> Result<(), CommandError> {
    let id = ProductId::new(id);
    report(accepted(shop.cart().remove_item(&id).await?)?.message);
    Ok(())
}

/// Empty the cart.
pub async fn clear(shop: &Storefront) -> Result<(), CommandError> {
    accepted(shop.cart().clear().await?)?;
    output::print("Cart cleared");
    Ok(())
}

fn report(message: Option<String>) {
    if let Some(message) = message {
        output::print(&message);
    }
}
