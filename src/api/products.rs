//! Catalogue browsing (no login required)

use anyhow::Result;

use super::client::ApiClient;
use super::error::ApiError;
use super::paths;
use super::transport::ApiRequest;
use crate::app::App;
use crate::models::{Listing, Product, ProductCategory};

/// Filters for the product list
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<i64>,
    pub ordering: Option<String>,
    pub page: Option<u32>,
}

impl ProductQuery {
    fn apply(&self, mut req: ApiRequest) -> ApiRequest {
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            req = req.query("search", search);
        }
        if let Some(category) = self.category {
            req = req.query("category", category);
        }
        if let Some(ordering) = self.ordering.as_deref().filter(|s| !s.is_empty()) {
            req = req.query("ordering", ordering);
        }
        if let Some(page) = self.page {
            req = req.query("page", page);
        }
        req
    }
}

pub async fn list_products(
    api: &ApiClient,
    query: &ProductQuery,
) -> Result<Listing<Product>, ApiError> {
    let resp = api.public(query.apply(ApiRequest::get(paths::PRODUCTS))).await?;
    resp.json(paths::PRODUCTS)
}

pub async fn get_product(api: &ApiClient, id: i64) -> Result<Product, ApiError> {
    let path = paths::product(id);
    let resp = api.public(ApiRequest::get(&path)).await?;
    resp.json(&path)
}

pub async fn list_categories(api: &ApiClient) -> Result<Vec<ProductCategory>, ApiError> {
    let resp = api.public(ApiRequest::get(paths::CATEGORIES)).await?;
    let listing: Listing<ProductCategory> = resp.json(paths::CATEGORIES)?;
    Ok(listing.into_items())
}

/// Print a page of products
pub async fn show_products(api_url: Option<String>, query: ProductQuery) -> Result<()> {
    let app = App::load(api_url)?;
    let listing = list_products(&app.api, &query).await?;

    if listing.items().is_empty() {
        println!("No products found.");
        return Ok(());
    }

    println!();
    for product in listing.items() {
        let category = product
            .category
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("-");
        let stock = if product.quantity == 0 {
            "out of stock".to_string()
        } else {
            format!("{} in stock", product.quantity)
        };
        println!(
            "  [{}] {:<36} {:>9}  {:<16} {}",
            product.id, product.name, product.price, category, stock
        );
    }
    println!();
    println!(
        "  Showing {} of {} product(s){}{}",
        listing.items().len(),
        listing.total(),
        if listing.has_previous() { "  [prev]" } else { "" },
        if listing.has_next() { "  [next]" } else { "" },
    );

    Ok(())
}

pub async fn show_product(api_url: Option<String>, id: i64) -> Result<()> {
    let app = App::load(api_url)?;
    let product = get_product(&app.api, id).await?;

    println!();
    println!("{} (#{})", product.name, product.id);
    println!("Price:    {}", product.price);
    println!("In stock: {}", product.quantity);
    if let Some(category) = &product.category {
        println!("Category: {}", category.name);
    }
    if !product.desc.is_empty() {
        println!();
        println!("{}", product.desc);
    }

    Ok(())
}

pub async fn show_categories(api_url: Option<String>) -> Result<()> {
    let app = App::load(api_url)?;
    let categories = list_categories(&app.api).await?;

    println!();
    for category in categories {
        println!("  [{}] {}", category.id, category.name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::mock::MockTransport;
    use crate::auth::TokenStore;
    use crate::config::MemoryStore;
    use reqwest::Method;
    use serde_json::json;
    use std::sync::Arc;

    fn client() -> (Arc<MockTransport>, ApiClient) {
        let mock = Arc::new(MockTransport::new());
        let tokens = TokenStore::new(Arc::new(MemoryStore::default()));
        let api = ApiClient::new(mock.clone(), tokens);
        (mock, api)
    }

    #[tokio::test]
    async fn test_list_products_passes_filters() {
        let (mock, api) = client();
        mock.on(
            Method::GET,
            paths::PRODUCTS,
            200,
            json!({ "count": 1, "next": null, "previous": null, "results": [
                { "id": 1, "name": "Mug", "price": "9.99", "quantity": 4 }
            ]}),
        );

        let query = ProductQuery {
            search: Some("mug".into()),
            category: Some(2),
            ordering: Some("-price".into()),
            page: None,
        };
        let listing = list_products(&api, &query).await.unwrap();
        assert_eq!(listing.items()[0].name, "Mug");

        let req = &mock.requests()[0];
        assert_eq!(req.bearer, None);
        assert_eq!(req.query_value("search"), Some("mug"));
        assert_eq!(req.query_value("category"), Some("2"));
        assert_eq!(req.query_value("ordering"), Some("-price"));
        assert_eq!(req.query_value("page"), None);
    }

    #[tokio::test]
    async fn test_categories_bare_array() {
        let (mock, api) = client();
        mock.on(
            Method::GET,
            paths::CATEGORIES,
            200,
            json!([{ "id": 1, "name": "Kitchen" }, { "id": 2, "name": "Garden" }]),
        );

        let categories = list_categories(&api).await.unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[1].name, "Garden");
    }

    #[tokio::test]
    async fn test_missing_product() {
        let (_mock, api) = client();
        let err = get_product(&api, 404).await.unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 404, .. }));
    }
}
