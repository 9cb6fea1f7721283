//! Orders, payments, checkout initiation and saved addresses

use anyhow::{Context, Result};

use super::client::ApiClient;
use super::error::ApiError;
use super::paths;
use super::transport::ApiRequest;
use crate::app::App;
use crate::models::{
    Address, AddressType, CheckoutSession, Listing, Order, OrderStatus, Payment,
};
use crate::notify::Reported;

async fn get_json<T: serde::de::DeserializeOwned>(
    api: &ApiClient,
    path: &str,
) -> Result<T, ApiError> {
    let resp = api.authed(ApiRequest::get(path)).await?;
    resp.json(path)
}

pub async fn list_orders(api: &ApiClient) -> Result<Vec<Order>, ApiError> {
    let listing: Listing<Order> = get_json(api, paths::ORDERS).await?;
    Ok(listing.into_items())
}

pub async fn get_order(api: &ApiClient, id: i64) -> Result<Order, ApiError> {
    get_json(api, &paths::order(id)).await
}

pub async fn list_payments(api: &ApiClient) -> Result<Vec<Payment>, ApiError> {
    let listing: Listing<Payment> = get_json(api, paths::PAYMENTS).await?;
    Ok(listing.into_items())
}

pub async fn list_addresses(api: &ApiClient) -> Result<Vec<Address>, ApiError> {
    let listing: Listing<Address> = get_json(api, paths::ADDRESSES).await?;
    Ok(listing.into_items())
}

/// Ask the server for a hosted checkout session for `order_id`.
pub async fn create_checkout_session(
    api: &ApiClient,
    order_id: i64,
) -> Result<CheckoutSession, ApiError> {
    let path = paths::stripe_checkout(order_id);
    let resp = api.authed(ApiRequest::post(&path)).await?;
    resp.json(&path)
}

fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "pending",
        OrderStatus::Completed => "completed",
    }
}

pub async fn show_orders(api_url: Option<String>) -> Result<()> {
    let app = App::authenticated(api_url).await?;
    let orders = list_orders(&app.api).await?;

    if orders.is_empty() {
        println!("No orders yet.");
        return Ok(());
    }

    println!();
    for order in orders {
        println!(
            "  #{:<6} {:<10} {:>3} item(s)  {:>10}  {}",
            order.id,
            status_label(order.status),
            order.order_items.len(),
            order.total_cost,
            order.created_at.as_deref().unwrap_or("")
        );
    }

    Ok(())
}

pub async fn show_order(api_url: Option<String>, id: i64) -> Result<()> {
    let app = App::authenticated(api_url).await?;
    let order = get_order(&app.api, id).await?;

    println!();
    println!("Order #{} ({})", order.id, status_label(order.status));
    for item in &order.order_items {
        println!(
            "  {:<36} {:>3} x {:>8} = {:>9}",
            item.product.name, item.quantity, item.price, item.cost
        );
    }
    println!("Total: {}", order.total_cost);
    if let Some(addr) = &order.shipping_address {
        println!(
            "Ship to: {}, {} {}, {}",
            addr.street_address, addr.postal_code, addr.city, addr.country
        );
    }

    Ok(())
}

pub async fn checkout(api_url: Option<String>, order_id: i64) -> Result<()> {
    let app = App::authenticated(api_url).await?;

    let session = match create_checkout_session(&app.api, order_id).await {
        Ok(session) => session,
        Err(e) => {
            app.notifier
                .error(&e.user_message("Could not start checkout"));
            return Err(Reported(format!("Checkout failed: {}", e)).into());
        }
    };

    let url = session
        .checkout_url
        .context("Checkout response did not include a payment URL")?;
    app.notifier.success("Checkout session created");
    println!("Complete payment at: {}", url);
    Ok(())
}

pub async fn show_payments(api_url: Option<String>) -> Result<()> {
    let app = App::authenticated(api_url).await?;
    let payments = list_payments(&app.api).await?;

    if payments.is_empty() {
        println!("No payments yet.");
        return Ok(());
    }

    println!();
    for payment in payments {
        println!(
            "  #{:<6} order #{:<6} {:?} via {:?}",
            payment.id, payment.order, payment.status, payment.payment_option
        );
    }

    Ok(())
}

pub async fn show_addresses(api_url: Option<String>) -> Result<()> {
    let app = App::authenticated(api_url).await?;
    let addresses = list_addresses(&app.api).await?;

    if addresses.is_empty() {
        println!("No saved addresses.");
        return Ok(());
    }

    println!();
    for addr in addresses {
        let kind = match addr.address_type {
            AddressType::Billing => "billing",
            AddressType::Shipping => "shipping",
        };
        println!(
            "  [{}] {:<8}{} {} {}, {} {}, {}",
            addr.id,
            kind,
            if addr.default { " (default)" } else { "" },
            addr.street_address,
            addr.apartment_address,
            addr.postal_code,
            addr.city,
            addr.country
        );
    }

    Ok(())
}
