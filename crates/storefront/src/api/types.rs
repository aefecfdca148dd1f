//! Wire types for the Opto-World REST API.
//!
//! The backend is loose about optional fields: arrays may be missing or
//! `null`, numbers may be absent, and a product's `reviews` is sometimes a
//! count and sometimes the review documents themselves. Everything here
//! decodes such gaps to a defined default instead of failing.

use chrono::{DateTime, NaiveDate, Utc};
use opto_world_core::{
    BookingId, BookingStatus, ContactId, ContactStatus, CurrencyCode, Email, Price, ProductId,
    ReviewId, UserId, UserRole,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Decode `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// =============================================================================
// Cart
// =============================================================================

/// Product fields denormalized into cart lines and wishlists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_type: Option<String>,
    /// Units in stock, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: ProductRef,
    pub quantity: u32,
    /// Unit price captured when the product was added.
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: Decimal,
}

impl CartLine {
    /// `price * quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// The server's cart document.
///
/// `total_items` and `total_price` are computed by the backend and are
/// never recomputed locally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<CartLine>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_items: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_price: Decimal,
}

impl CartSnapshot {
    /// The line for `product_id`, if present.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.items.iter().find(|line| &line.product.id == product_id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The total as a displayable price.
    #[must_use]
    pub const fn total(&self) -> Price {
        Price::new(self.total_price, CurrencyCode::INR)
    }
}

// =============================================================================
// Wishlist
// =============================================================================

/// The server's wishlist document.
///
/// Items may arrive as product objects or bare id strings. Duplicate ids are
/// collapsed on decode, keeping the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WishlistWire")]
pub struct WishlistSnapshot {
    pub items: Vec<ProductRef>,
}

impl WishlistSnapshot {
    /// Whether `product_id` is on the list.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.id == product_id)
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Deserialize)]
struct WishlistWire {
    #[serde(default, deserialize_with = "null_as_default")]
    items: Vec<WishlistItemWire>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WishlistItemWire {
    Id(ProductId),
    Product(ProductRef),
}

impl From<WishlistWire> for WishlistSnapshot {
    fn from(wire: WishlistWire) -> Self {
        let mut items: Vec<ProductRef> = Vec::with_capacity(wire.items.len());
        for item in wire.items {
            let product = match item {
                WishlistItemWire::Id(id) => ProductRef {
                    id,
                    ..ProductRef::default()
                },
                WishlistItemWire::Product(product) => product,
            };
            if !items.iter().any(|seen| seen.id == product.id) {
                items.push(product);
            }
        }
        Self { items }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub brand: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub frame_type: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub features: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub in_stock: bool,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub rating: Option<f64>,
    /// Number of reviews.
    #[serde(default, deserialize_with = "review_count")]
    pub reviews: u32,
}

impl Product {
    /// Current selling price.
    #[must_use]
    pub const fn price(&self) -> Price {
        Price::new(self.price, CurrencyCode::INR)
    }

    /// Percentage off the original price, rounded down.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        use rust_decimal::prelude::ToPrimitive;

        let original = self.original_price.filter(|p| *p > self.price)?;
        ((original - self.price) * Decimal::ONE_HUNDRED / original)
            .floor()
            .to_u32()
    }
}

/// `reviews` is a count on list endpoints and an array on some detail views.
fn review_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Reviews {
        Count(u32),
        List(Vec<serde::de::IgnoredAny>),
    }

    Ok(match Option::<Reviews>::deserialize(deserializer)? {
        Some(Reviews::Count(n)) => n,
        Some(Reviews::List(list)) => u32::try_from(list.len()).unwrap_or(u32::MAX),
        None => 0,
    })
}

/// Filters for the product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub frame_type: Option<String>,
    pub search: Option<String>,
}

impl ProductQuery {
    /// Query-string pairs for the non-empty filters.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("category", self.category.as_deref()),
            ("brand", self.brand.as_deref()),
            ("frameType", self.frame_type.as_deref()),
            ("search", self.search.as_deref()),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.filter(|v| !v.is_empty()).map(|v| (k, v)))
        .collect()
    }

    /// Whether no filter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs().is_empty()
    }
}

/// A product review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(rename = "_id", alias = "id")]
    pub id: ReviewId,
    pub rating: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String,
    #[serde(default, alias = "userName")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub helpful: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Auth
// =============================================================================

/// The user document returned by the auth endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: UserId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: UserRole,
}

/// A successful login or signup.
pub struct AuthSession {
    pub token: secrecy::SecretString,
    pub user: UserProfile,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

// =============================================================================
// Forms
// =============================================================================

/// A message from the contact page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub name: String,
    pub email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

/// A stored contact message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    #[serde(rename = "_id", alias = "id")]
    pub id: ContactId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ContactStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Eye test services offered at the clinics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EyeTestService {
    Comprehensive,
    ContactLens,
    DriverVision,
}

impl EyeTestService {
    /// Every service, in menu order.
    pub const ALL: [Self; 3] = [Self::Comprehensive, Self::ContactLens, Self::DriverVision];

    /// The wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Comprehensive => "comprehensive",
            Self::ContactLens => "contact-lens",
            Self::DriverVision => "driver-vision",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Comprehensive => "Comprehensive Eye Exam",
            Self::ContactLens => "Contact Lens Fitting",
            Self::DriverVision => "Driving Vision Test",
        }
    }

    /// Listed fee.
    #[must_use]
    pub fn fee(&self) -> Price {
        let rupees = match self {
            Self::Comprehensive => 999,
            Self::ContactLens => 799,
            Self::DriverVision => 499,
        };
        Price::new(Decimal::from(rupees), CurrencyCode::INR)
    }
}

impl std::str::FromStr for EyeTestService {
    type Err = opto_world_core::UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|service| service.as_str() == s)
            .ok_or_else(|| opto_world_core::UnknownVariant {
                kind: "eye test service",
                value: s.to_owned(),
            })
    }
}

/// An eye test appointment request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub name: String,
    pub email: Email,
    pub phone: String,
    /// Clinic, e.g. `banashankari`.
    pub location: String,
    pub test_type: EyeTestService,
    pub preferred_date: NaiveDate,
    /// `HH:MM`, 24-hour.
    pub preferred_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A stored booking.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id", alias = "id")]
    pub id: BookingId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Kept as text so retired services still decode.
    #[serde(default)]
    pub test_type: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: BookingStatus,
    #[serde(default, deserialize_with = "date_prefix")]
    pub preferred_date: Option<NaiveDate>,
    #[serde(default)]
    pub preferred_time: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Accept `2026-11-02` as well as a full timestamp like `2026-11-02T00:00:00.000Z`.
fn date_prefix<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    raw.get(..10)
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
}
