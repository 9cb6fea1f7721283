//! Login, logout, registration and status commands

use anyhow::{bail, Context, Result};

use super::claims::{decode_claims, is_token_expired};
use super::session::Identity;
use crate::app::App;
use crate::models::{LoginData, RegisterData};
use crate::notify::Reported;

/// Log in with email or phone number.
pub async fn login(
    api_url: Option<String>,
    data: LoginData,
    force: bool,
) -> Result<()> {
    if data.email.is_none() && data.phone_number.is_none() {
        bail!("Provide --email or --phone to log in.");
    }

    let mut app = App::load(api_url)?;

    // Check for an existing session
    if !force {
        app.session.initialize().await;
        if let Some(user) = app.session.user() {
            println!(
                "Already logged in as {}. Use --force to re-authenticate.",
                user.display_name()
            );
            return Ok(());
        }
    }

    tracing::info!("Logging in...");
    app.session
        .login(&data)
        .await
        .map_err(|e| Reported(format!("Login failed: {}", e)))?;
    Ok(())
}

pub async fn register(api_url: Option<String>, data: RegisterData) -> Result<()> {
    if data.password != data.password_confirm {
        bail!("Passwords do not match.");
    }

    let app = App::load(api_url)?;
    app.session
        .register(&data)
        .await
        .map_err(|e| Reported(format!("Registration failed: {}", e)))?;
    println!("Run 'storefront login' once your account is verified.");
    Ok(())
}

/// Clear stored credentials
pub async fn logout(api_url: Option<String>) -> Result<()> {
    let mut app = App::load(api_url)?;
    app.session.logout().await;
    Ok(())
}

fn describe_token(label: &str, token: Option<String>) {
    match token {
        Some(token) if !is_token_expired(&token) => {
            println!("{} valid", label);
            if let Some(exp) = decode_claims(&token).ok().and_then(|c| c.exp) {
                println!("  expires_at: {}", exp);
            }
        }
        Some(_) => println!("{} expired", label),
        None => println!("{} none", label),
    }
}

/// Display stored token status without contacting the server
pub async fn status(api_url: Option<String>) -> Result<()> {
    let app = App::load(api_url)?;
    let tokens = app.api.tokens();

    println!("API:           {}", app.config.api_url);
    describe_token("Access token: ", tokens.access_token());
    describe_token("Refresh token:", tokens.refresh_token());

    if !tokens.has_credentials() {
        println!("\nRun 'storefront login' to authenticate.");
    }

    Ok(())
}

/// Restore the session and show who it belongs to.
pub async fn whoami(api_url: Option<String>) -> Result<()> {
    let mut app = App::authenticated(api_url).await?;

    // Identity came from token claims; give the profile endpoint another try.
    if app.session.user().is_some_and(|u| !u.is_verified()) {
        if let Err(e) = app.session.refresh_user().await {
            tracing::debug!("Profile still unavailable: {}", e);
        }
    }

    let user = app.session.user().context("No session")?;

    println!();
    println!("Name:  {}", user.display_name());
    println!("Email: {}", user.email().unwrap_or("(none)"));
    if let Some(id) = user.user_id() {
        println!("ID:    {}", id);
    }
    match user {
        Identity::Verified(profile) => {
            if let Some(phone) = &profile.phone_number {
                println!("Phone: {}", phone);
            }
            if let Some(joined) = &profile.date_joined {
                println!("Since: {}", joined);
            }
        }
        Identity::Unverified(_) => {
            println!("\n(profile unavailable; identity read from stored token, not verified)");
        }
    }

    Ok(())
}
