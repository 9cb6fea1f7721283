//! Order, payment and checkout models

use serde::{Deserialize, Serialize};

use super::{Address, Product};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "P")]
    Pending,
    #[serde(rename = "C")]
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub product: Product,
    pub quantity: u32,
    pub price: String,
    pub cost: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub status: OrderStatus,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    pub total_cost: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "P")]
    Pending,
    #[serde(rename = "C")]
    Completed,
    #[serde(rename = "F")]
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PaymentOption {
    #[serde(rename = "P")]
    PayPal,
    #[serde(rename = "S")]
    Stripe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub status: PaymentStatus,
    pub payment_option: PaymentOption,
    pub order: i64,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Hosted checkout session created for an order
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckoutSession {
    #[serde(default, alias = "url", alias = "checkoutUrl")]
    pub checkout_url: Option<String>,
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<String>,
}
