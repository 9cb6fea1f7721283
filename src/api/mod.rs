//! API client module for the storefront

pub mod cart;
pub mod client;
pub mod error;
mod orders;
pub mod paths;
mod products;
pub mod transport;

pub use cart::CartAction;
pub use products::ProductQuery;

use anyhow::Result;

/// List products (no login required)
pub async fn list_products(api_url: Option<String>, query: ProductQuery) -> Result<()> {
    products::show_products(api_url, query).await
}

/// Show a single product
pub async fn show_product(api_url: Option<String>, id: i64) -> Result<()> {
    products::show_product(api_url, id).await
}

/// List product categories
pub async fn list_categories(api_url: Option<String>) -> Result<()> {
    products::show_categories(api_url).await
}

/// Show or change the cart
pub async fn cart(api_url: Option<String>, action: CartAction) -> Result<()> {
    cart::run(api_url, action).await
}

/// List the user's orders
pub async fn list_orders(api_url: Option<String>) -> Result<()> {
    orders::show_orders(api_url).await
}

/// Show one order
pub async fn show_order(api_url: Option<String>, id: i64) -> Result<()> {
    orders::show_order(api_url, id).await
}

/// Start hosted checkout for an order
pub async fn checkout(api_url: Option<String>, order_id: i64) -> Result<()> {
    orders::checkout(api_url, order_id).await
}

/// List payments
pub async fn list_payments(api_url: Option<String>) -> Result<()> {
    orders::show_payments(api_url).await
}

/// List saved addresses
pub async fn list_addresses(api_url: Option<String>) -> Result<()> {
    orders::show_addresses(api_url).await
}
