//! Catalog commands.

use opto_world_core::ProductId;
use opto_world_storefront::Storefront;
use opto_world_storefront::api::ProductQuery;

use super::CommandError;
use crate::output;

/// List products matching `query`.
pub async fn products(shop: &Storefront, query: &ProductQuery) -> Result<(), CommandError> {
    let products = shop.api().list_products(query).await?.into_result()?;
    output::print(&output::products(&products));
    Ok(())
}

/// Show one product, optionally with its reviews.
pub async fn product(shop: &Storefront, id: &str, with_reviews: bool) -> Result<(), CommandError> {
    let id = ProductId::new(id);
    let product = shop.api().get_product(&id).await?.into_result()?;

    let reviews = if with_reviews {
        Some(shop.api().list_reviews(&id).await?.into_result()?)
    } else {
        None
    };
    output::print(&output::product(&product, reviews.as_deref()));
    Ok(())
}
