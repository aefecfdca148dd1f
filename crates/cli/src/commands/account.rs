//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! OPTOWORLD_PASSWORD=... ow-cli login -e asha@example.com
//! ow-cli whoami --refresh
//! ow-cli logout
//! ```

use opto_world_storefront::Storefront;
use secrecy::SecretString;

use super::CommandError;
use crate::output;

/// Sign in and store the session.
pub async fn login(shop: &Storefront, email: &str, password: String) -> Result<(), CommandError> {
    let password = SecretString::from(password);
    let user = shop.auth().login(email, &password).await?;
    tracing::info!(email = %user.email, "Signed in");
    output::print(&format!("Welcome back, {}!", user.name));
    Ok(())
}

/// Create an account and store the session.
pub async fn signup(
    shop: &Storefront,
    name: &str,
    email: &str,
    password: String,
    confirm_password: String,
) -> Result<(), CommandError> {
    let password = SecretString::from(password);
    let confirm_password = SecretString::from(confirm_password);
    let user = shop
        .auth()
        .signup(name, email, &password, &confirm_password)
        .await?;
    tracing::info!(email = %user.email, "Account created");
    output::print(&format!("Welcome, {}!", user.name));
    Ok(())
}

/// Forget the stored session.
pub fn logout(shop: &Storefront) -> Result<(), CommandError> {
    shop.auth().logout()?;
    output::print("Signed out");
    Ok(())
}

/// Show the cached profile, optionally reloading it first.
pub async fn whoami(shop: &Storefront, refresh: bool) -> Result<(), CommandError> {
    if !shop.session().is_authenticated() {
        output::print("Not signed in");
        return Ok(());
    }
    if refresh {
        shop.auth().refresh_profile().await?;
    }
    output::print(&output::profile(&shop.session().profile()?));
    Ok(())
}
