//! Server-held cart snapshot

use serde::{Deserialize, Serialize};

use super::Product;

/// One cart line with its server-computed total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(default)]
    pub id: Option<i64>,
    pub product: Product,
    pub quantity: u32,
    #[serde(default)]
    pub total_price: String,
}

/// Full cart as computed by the server. Replaces local state wholesale.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total_items: u32,
    #[serde(default = "zero_cost")]
    pub total_cost: String,
}

fn zero_cost() -> String {
    "0.00".to_string()
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
