//! User-related models

use serde::{Deserialize, Serialize};

/// User profile as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub date_joined: Option<String>,
}

fn default_active() -> bool {
    true
}

/// Login credentials: email or phone number plus password
#[derive(Debug, Clone, Serialize)]
pub struct LoginData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub password: String,
}

/// Registration form
#[derive(Debug, Clone, Serialize)]
pub struct RegisterData {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub password: String,
    pub password_confirm: String,
}

/// Address kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AddressType {
    #[serde(rename = "B")]
    Billing,
    #[serde(rename = "S")]
    Shipping,
}

/// Saved billing or shipping address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: i64,
    pub address_type: AddressType,
    #[serde(default)]
    pub default: bool,
    pub country: String,
    pub city: String,
    pub street_address: String,
    #[serde(default)]
    pub apartment_address: String,
    pub postal_code: String,
}
