//! Review commands.

use opto_world_core::{ProductId, ReviewId};
use opto_world_storefront::Storefront;

use super::CommandError;
use crate::output;

const MAX_RATING: u8 = 5;

/// Review a product.
pub async fn add(
    shop: &Storefront,
    product_id: &str,
    rating: u8,
    comment: &str,
) -> Result<(), CommandError> {
    let rating = check_rating(rating)?;
    let response = shop
        .api()
        .create_review(&ProductId::new(product_id), rating, comment.trim())
        .await?;
    let message = response.message().map(str::to_owned);
    response.into_result()?;
    output::print(message.as_deref().unwrap_or("Review added"));
    Ok(())
}

/// Change one of your reviews.
pub async fn edit(
    shop: &Storefront,
    id: &str,
    rating: u8,
    comment: &str,
) -> Result<(), CommandError> {
    let rating = check_rating(rating)?;
    shop.api()
        .update_review(&ReviewId::new(id), rating, comment.trim())
        .await?
        .into_result()?;
    output::print("Review updated");
    Ok(())
}

/// Delete one of your reviews.
pub async fn delete(shop: &Storefront, id: &str) -> Result<(), CommandError> {
    shop.api()
        .delete_review(&ReviewId::new(id))
        .await?
        .into_result()?;
    output::print("Review deleted");
    Ok(())
}

/// Vote a review helpful.
pub async fn helpful(shop: &Storefront, id: &str) -> Result<(), CommandError> {
    let review = shop
        .api()
        .mark_review_helpful(&ReviewId::new(id))
        .await?
        .into_result()?;
    match review {
        Some(review) => output::print(&format!("{} people found this helpful", review.helpful)),
        None => output::print("Thanks for your feedback"),
    }
    Ok(())
}

fn check_rating(rating: u8) -> Result<u8, CommandError> {
    if (1..=MAX_RATING).contains(&rating) {
        return Ok(rating);
    }
    Err(CommandError::Invalid {
        field: "rating",
        reason: format!("must be between 1 and {MAX_RATING}"),
    })
}
