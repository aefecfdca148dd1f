//! Cache types for catalog responses.

use opto_world_core::ProductId;

use super::types::{Product, Review};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    /// The unfiltered listing. Filtered listings are not cached.
    AllProducts,
    Reviews(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Reviews(Vec<Review>),
}
