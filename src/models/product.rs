//! Catalogue models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Product listing entry. Prices are decimal strings as sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub category: Option<ProductCategory>,
    #[serde(default)]
    pub image: Option<String>,
    /// Units in stock
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub seller: Option<i64>,
}

/// List endpoints answer with either a paginated envelope or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Page {
        count: u64,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        previous: Option<String>,
        results: Vec<T>,
    },
    Items(Vec<T>),
}

impl<T> Listing<T> {
    pub fn items(&self) -> &[T] {
        match self {
            Listing::Page { results, .. } => results,
            Listing::Items(items) => items,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Page { results, .. } => results,
            Listing::Items(items) => items,
        }
    }

    /// Total across all pages, when the server reports it.
    pub fn total(&self) -> usize {
        match self {
            Listing::Page { count, .. } => *count as usize,
            Listing::Items(items) => items.len(),
        }
    }

    pub fn has_next(&self) -> bool {
        matches!(self, Listing::Page { next: Some(_), .. })
    }

    pub fn has_previous(&self) -> bool {
        matches!(self, Listing::Page { previous: Some(_), .. })
    }
}
