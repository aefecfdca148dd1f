//! Terminal rendering.
//!
//! Formatting functions return strings so they can be tested; [`print`] is
//! the only place that writes to stdout.

use std::fmt::Write as _;

use opto_world_core::{CurrencyCode, Price};
use opto_world_storefront::api::{
    Booking, CartSnapshot, ContactMessage, Product, Review, WishlistSnapshot,
};
use opto_world_storefront::SessionProfile;

/// Write command output to stdout.
#[allow(clippy::print_stdout)]
pub fn print(text: &str) {
    println!("{text}");
}

/// Report an error before logging is set up and exit.
#[allow(clippy::print_stderr)]
pub fn fatal(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(2);
}

fn rupees(amount: rust_decimal::Decimal) -> Price {
    Price::new(amount, CurrencyCode::INR)
}

/// One line per cart entry plus a totals line.
pub fn cart(cart: &CartSnapshot) -> String {
    if cart.is_empty() {
        return "Your cart is empty".to_string();
    }

    let mut out = String::new();
    for line in &cart.items {
        let _ = writeln!(
            out,
            "{:<26} {:<28} {:>3} x {:>10} = {:>10}",
            line.product.id.as_str(),
            line.product.name,
            line.quantity,
            rupees(line.price).display(),
            rupees(line.subtotal()).display(),
        );
    }
    let _ = write!(out, "{} items, total {}", cart.total_items, cart.total());
    out
}

/// One line per wishlisted product.
pub fn wishlist(wishlist: &WishlistSnapshot) -> String {
    if wishlist.is_empty() {
        return "Your wishlist is empty".to_string();
    }

    wishlist
        .items
        .iter()
        .map(|item| format!("{:<26} {} ({})", item.id.as_str(), item.name, item.brand))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Catalog listing.
pub fn products(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products found".to_string();
    }

    products
        .iter()
        .map(|p| {
            let mut row = format!(
                "{:<26} {:<30} {:<14} {:>10}",
                p.id.as_str(),
                p.name,
                p.brand,
                p.price().display()
            );
            if let Some(off) = p.discount_percent() {
                let _ = write!(row, " ({off}% off)");
            }
            if !p.in_stock {
                row.push_str(" [out of stock]");
            }
            row
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Product detail page.
pub fn product(product: &Product, reviews: Option<&[Review]>) -> String {
    let mut out = format!("{} - {}\n", product.name, product.brand);
    let _ = write!(out, "Price: {}", product.price());
    if let Some(original) = product
        .original_price
        .filter(|_| product.discount_percent().is_some())
    {
        let _ = write!(out, " (was {})", rupees(original));
    }
    out.push('\n');
    for (label, value) in [
        ("Category", &product.category),
        ("Frame", &product.frame_type),
        ("Colour", &product.color),
        ("Material", &product.material),
    ] {
        if let Some(value) = value {
            let _ = writeln!(out, "{label}: {value}");
        }
    }
    match product.stock {
        Some(stock) if product.in_stock => {
            let _ = writeln!(out, "In stock: {stock}");
        }
        _ if product.in_stock => out.push_str("In stock\n"),
        _ => out.push_str("Out of stock\n"),
    }
    if let Some(rating) = product.rating {
        let _ = writeln!(out, "Rating: {rating:.1} ({} reviews)", product.reviews);
    }
    if let Some(description) = &product.description {
        let _ = writeln!(out, "\n{description}");
    }
    for feature in &product.features {
        let _ = writeln!(out, "  - {feature}");
    }

    if let Some(reviews) = reviews {
        out.push_str("\nReviews:\n");
        if reviews.is_empty() {
            out.push_str("  No reviews yet\n");
        }
        for review in reviews {
            let _ = writeln!(
                out,
                "  {}/5 {}: {}",
                review.rating,
                review.name.as_deref().unwrap_or("Anonymous"),
                review.comment
            );
        }
    }
    out.trim_end().to_string()
}

/// Back-office booking list.
pub fn bookings(bookings: &[Booking]) -> String {
    if bookings.is_empty() {
        return "No bookings".to_string();
    }

    bookings
        .iter()
        .map(|b| {
            let when = match (b.preferred_date, b.preferred_time.as_deref()) {
                (Some(date), Some(time)) => format!("{date} {time}"),
                (Some(date), None) => date.to_string(),
                (None, _) => "unscheduled".to_string(),
            };
            format!(
                "{:<26} {:<10} {:<20} {:<24} {} {} [{}]",
                b.id.as_str(),
                b.status.as_str(),
                when,
                b.name,
                b.phone,
                b.test_type.as_deref().unwrap_or("-"),
                b.location.as_deref().unwrap_or("-"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Back-office contact message list.
pub fn contacts(contacts: &[ContactMessage]) -> String {
    if contacts.is_empty() {
        return "No messages".to_string();
    }

    let mut out = String::new();
    for c in contacts {
        let _ = writeln!(
            out,
            "{:<26} {:<8} {} <{}>: {}",
            c.id.as_str(),
            c.status.as_str(),
            c.name,
            c.email,
            c.subject
        );
        if !c.message.is_empty() {
            let _ = writeln!(out, "    {}", c.message);
        }
    }
    out.trim_end().to_string()
}

/// Signed-in user summary.
pub fn profile(profile: &SessionProfile) -> String {
    let mut out = format!(
        "{} <{}>",
        profile.name.as_deref().unwrap_or("(no name)"),
        profile.email.as_ref().map_or("no email", |e| e.as_str())
    );
    let _ = write!(out, "\nRole: {}", profile.role);
    if let Some(phone) = &profile.phone {
        let _ = write!(out, "\nPhone: {phone}");
    }
    if let Some(address) = &profile.address {
        let _ = write!(out, "\nAddress: {address}");
    }
    out
}
