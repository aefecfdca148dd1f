//! Opto-World CLI - Storefront client for the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password from the prompt-free env var)
//! OPTOWORLD_PASSWORD=... ow-cli login -e asha@example.com
//!
//! # Browse the catalog
//! ow-cli products --brand "Ray-Ban" --frame-type aviator
//! ow-cli product 665f1c2e9b1d4a0012345678 --reviews
//!
//! # Manage the cart and wishlist
//! ow-cli cart add 665f1c2e9b1d4a0012345678 -q 2
//! ow-cli cart show
//! ow-cli wishlist has 665f1c2e9b1d4a0012345678
//!
//! # Book an eye test
//! ow-cli book -n "Asha Rao" -e asha@example.com -p 9876543210 \
//!     -l Koramangala -t comprehensive -d 2026-11-02 --time "10:30 AM"
//!
//! # Review a product
//! ow-cli review add 665f1c2e9b1d4a0012345678 -r 5 -c "Great fit"
//!
//! # Back office (admin accounts only)
//! ow-cli admin bookings
//! ow-cli admin contact-status 665f1c2e9b1d4a0012345679 replied
//! ```
//!
//! # Commands
//!
//! - `login` / `signup` / `logout` / `whoami` - Session management
//! - `products` / `product` - Catalog reads
//! - `cart` - Show and change the cart
//! - `wishlist` - Show and change the wishlist
//! - `services` / `book` / `contact` - Eye tests and enquiries
//! - `review` - Write, edit and vote on reviews
//! - `admin` - Bookings, messages, product removal and admin accounts
//!
//! The session is kept in the file named by `OPTOWORLD_STORAGE_PATH`, so
//! later invocations reuse the sign-in of earlier ones. Each write re-reads
//! the file first, but there is no cross-process lock: two invocations
//! writing at the same moment can still lose one of the writes.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use opto_world_storefront::StorefrontConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "ow-cli")]
#[command(author, version, about = "Opto-World storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(long, env = "OPTOWORLD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Signup {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 6 characters)
        #[arg(long, env = "OPTOWORLD_PASSWORD", hide_env_values = true)]
        password: String,

        /// Password confirmation
        #[arg(long, env = "OPTOWORLD_CONFIRM_PASSWORD", hide_env_values = true)]
        confirm_password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Reload the profile from the server first
        #[arg(long)]
        refresh: bool,
    },
    /// List products
    Products {
        /// Category filter (e.g. `sunglasses`)
        #[arg(long)]
        category: Option<String>,

        /// Brand filter
        #[arg(long)]
        brand: Option<String>,

        /// Frame type filter (e.g. `aviator`)
        #[arg(long)]
        frame_type: Option<String>,

        /// Free-text search
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Show one product
    Product {
        /// Product ID
        id: String,

        /// Include customer reviews
        #[arg(long)]
        reviews: bool,
    },
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Show or change the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// List bookable eye tests
    Services,
    /// Book an eye test
    Book {
        /// Full name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Phone number
        #[arg(short, long)]
        phone: String,

        /// Store location
        #[arg(short, long)]
        location: String,

        /// Test type (`comprehensive`, `contact-lens`, `driver-vision`)
        #[arg(short, long)]
        test_type: String,

        /// Preferred date (YYYY-MM-DD)
        #[arg(short = 'd', long)]
        date: String,

        /// Preferred time slot (e.g. "10:30 AM")
        #[arg(long)]
        time: String,

        /// Notes for the optometrist
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Send an enquiry
    Contact {
        /// Full name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Phone number
        #[arg(short, long)]
        phone: Option<String>,

        /// Subject line
        #[arg(short, long)]
        subject: String,

        /// Message body
        #[arg(short, long)]
        message: String,
    },
    /// Write, edit or vote on product reviews
    Review {
        #[command(subcommand)]
        action: ReviewAction,
    },
    /// Back-office tasks (admin accounts only)
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum ReviewAction {
    /// Review a product
    Add {
        /// Product ID
        product_id: String,

        /// Rating from 1 to 5
        #[arg(short, long)]
        rating: u8,

        /// Review text
        #[arg(short, long)]
        comment: String,
    },
    /// Change one of your reviews
    Edit {
        /// Review ID
        id: String,

        /// Rating from 1 to 5
        #[arg(short, long)]
        rating: u8,

        /// Review text
        #[arg(short, long)]
        comment: String,
    },
    /// Delete one of your reviews
    Delete {
        /// Review ID
        id: String,
    },
    /// Mark a review as helpful
    Helpful {
        /// Review ID
        id: String,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List eye test bookings
    Bookings,
    /// Set a booking's status
    BookingStatus {
        /// Booking ID
        id: String,

        /// `pending`, `confirmed`, `completed` or `cancelled`
        status: String,
    },
    /// Delete a booking
    DeleteBooking {
        /// Booking ID
        id: String,
    },
    /// List contact messages
    Contacts,
    /// Set a contact message's status
    ContactStatus {
        /// Contact message ID
        id: String,

        /// `new`, `read`, `replied` or `archived`
        status: String,
    },
    /// Delete a contact message
    DeleteContact {
        /// Contact message ID
        id: String,
    },
    /// Remove a product from the catalog
    DeleteProduct {
        /// Product ID
        id: String,
    },
    /// Create another admin account
    Signup {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password for the new account
        #[arg(long, env = "OPTOWORLD_NEW_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,

        /// Password confirmation
        #[arg(long, env = "OPTOWORLD_NEW_ADMIN_CONFIRM_PASSWORD", hide_env_values = true)]
        confirm_password: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart
    Show,
    /// Add a product
    Add {
        /// Product ID
        id: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity
    Update {
        /// Product ID
        id: String,

        /// New quantity
        quantity: u32,
    },
    /// Remove a product
    Remove {
        /// Product ID
        id: String,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Show the wishlist
    Show,
    /// Add a product
    Add {
        /// Product ID
        id: String,
    },
    /// Remove a product
    Remove {
        /// Product ID
        id: String,
    },
    /// Empty the wishlist
    Clear,
    /// Check whether a product is on the wishlist
    Has {
        /// Product ID
        id: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::debug!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => output::fatal(&format!("Failed to load configuration: {e}")),
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so command output stays clean on stdout
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "opto_world_storefront=warn,opto_world_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), CommandError> {
    let shop = commands::open(config)?;

    match cli.command {
        Commands::Login { email, password } => {
            commands::account::login(&shop, &email, password).await?;
        }
        Commands::Signup {
            name,
            email,
            password,
            confirm_password,
        } => {
            commands::account::signup(&shop, &name, &email, password, confirm_password).await?;
        }
        Commands::Logout => commands::account::logout(&shop)?,
        Commands::Whoami { refresh } => commands::account::whoami(&shop, refresh).await?,
        Commands::Products {
            category,
            brand,
            frame_type,
            search,
        } => {
            let query = opto_world_storefront::api::ProductQuery {
                category,
                brand,
                frame_type,
                search,
            };
            commands::catalog::products(&shop, &query).await?;
        }
        Commands::Product { id, reviews } => {
            commands::catalog::product(&shop, &id, reviews).await?;
        }
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&shop).await?,
            CartAction::Add { id, quantity } => commands::cart::add(&shop, &id, quantity).await?,
            CartAction::Update { id, quantity } => {
                commands::cart::update(&shop, &id, quantity).await?;
            }
            CartAction::Remove { id } => commands::cart::remove(&shop, &id).await?,
            CartAction::Clear => commands::cart::clear(&shop).await?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::wishlist::show(&shop).await?,
            WishlistAction::Add { id } => commands::wishlist::add(&shop, &id).await?,
            WishlistAction::Remove { id } => commands::wishlist::remove(&shop, &id).await?,
            WishlistAction::Clear => commands::wishlist::clear(&shop).await?,
            WishlistAction::Has { id } => commands::wishlist::has(&shop, &id).await?,
        },
        Commands::Services => commands::forms::services(),
        Commands::Book {
            name,
            email,
            phone,
            location,
            test_type,
            date,
            time,
            message,
        } => {
            let form = commands::forms::BookingForm {
                name,
                email,
                phone,
                location,
                test_type,
                date,
                time,
                message,
            };
            commands::forms::book(&shop, form).await?;
        }
        Commands::Contact {
            name,
            email,
            phone,
            subject,
            message,
        } => {
            let form = commands::forms::ContactForm {
                name,
                email,
                phone,
                subject,
                message,
            };
            commands::forms::contact(&shop, form).await?;
        }
        Commands::Review { action } => match action {
            ReviewAction::Add {
                product_id,
                rating,
                comment,
            } => commands::reviews::add(&shop, &product_id, rating, &comment).await?,
            ReviewAction::Edit {
                id,
                rating,
                comment,
            } => commands::reviews::edit(&shop, &id, rating, &comment).await?,
            ReviewAction::Delete { id } => commands::reviews::delete(&shop, &id).await?,
            ReviewAction::Helpful { id } => commands::reviews::helpful(&shop, &id).await?,
        },
        Commands::Admin { action } => match action {
            AdminAction::Bookings => commands::admin::bookings(&shop).await?,
            AdminAction::BookingStatus { id, status } => {
                commands::admin::booking_status(&shop, &id, &status).await?;
            }
            AdminAction::DeleteBooking { id } => commands::admin::delete_booking(&shop, &id).await?,
            AdminAction::Contacts => commands::admin::contacts(&shop).await?,
            AdminAction::ContactStatus { id, status } => {
                commands::admin::contact_status(&shop, &id, &status).await?;
            }
            AdminAction::DeleteContact { id } => commands::admin::delete_contact(&shop, &id).await?,
            AdminAction::DeleteProduct { id } => commands::admin::delete_product(&shop, &id).await?,
            AdminAction::Signup {
                name,
                email,
                password,
                confirm_password,
            } => {
                commands::admin::signup(&shop, &name, &email, password, confirm_password).await?;
            }
        },
    }
    Ok(())
}
