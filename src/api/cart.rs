//! Server-authoritative cart
//!
//! Every mutation returns the full cart and the local copy is replaced with
//! it. Nothing is merged or computed locally.

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;

use super::client::ApiClient;
use super::error::ApiError;
use super::paths;
use super::transport::ApiRequest;
use crate::app::App;
use crate::models::Cart;
use crate::notify::{Notifier, Reported};

pub struct CartClient {
    api: Arc<ApiClient>,
    notifier: Arc<dyn Notifier>,
    cart: Cart,
}

impl CartClient {
    pub fn new(api: Arc<ApiClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            cart: Cart::default(),
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Item count as last reported by the server.
    pub fn count(&self) -> u32 {
        self.cart.total_items
    }

    fn ensure_session(&self) -> Result<(), ApiError> {
        if self.api.tokens().access_token().is_none() {
            self.notifier.error("Please log in to use your cart");
            return Err(ApiError::NoSession);
        }
        Ok(())
    }

    async fn send(&self, req: ApiRequest) -> Result<Cart, ApiError> {
        let path = req.path.clone();
        let resp = self.api.authed(req).await?;
        resp.json(&path)
    }

    /// Apply a mutation result: replace the snapshot or report the failure.
    fn apply(
        &mut self,
        result: Result<Cart, ApiError>,
        success: &str,
        failure: &str,
    ) -> Result<&Cart, ApiError> {
        match result {
            Ok(cart) => {
                self.cart = cart;
                self.notifier.success(success);
                Ok(&self.cart)
            }
            Err(e) => {
                tracing::warn!("{}: {}", failure, e);
                self.notifier.error(&e.user_message(failure));
                Err(e)
            }
        }
    }

    /// Load the current cart. A failed read keeps the previous snapshot.
    pub async fn fetch(&mut self) -> Result<&Cart, ApiError> {
        self.ensure_session()?;
        match self.send(ApiRequest::get(paths::CART)).await {
            Ok(cart) => {
                self.cart = cart;
                Ok(&self.cart)
            }
            Err(e) => {
                tracing::warn!("Failed to load cart: {}", e);
                Err(e)
            }
        }
    }

    pub async fn add_item(&mut self, product_id: i64, quantity: u32) -> Result<&Cart, ApiError> {
        self.ensure_session()?;
        let req = ApiRequest::post(paths::CART_ITEMS)
            .json(json!({ "product_id": product_id, "quantity": quantity }));
        let result = self.send(req).await;
        self.apply(result, "Added to cart", "Failed to add item to cart")
    }

    /// Set the quantity of a line. Zero removes it.
    pub async fn update_item(
        &mut self,
        product_id: i64,
        quantity: u32,
    ) -> Result<&Cart, ApiError> {
        if quantity == 0 {
            return self.remove_item(product_id).await;
        }

        self.ensure_session()?;
        let req =
            ApiRequest::put(paths::cart_item(product_id)).json(json!({ "quantity": quantity }));
        let result = self.send(req).await;
        self.apply(result, "Cart updated", "Failed to update cart")
    }

    pub async fn remove_item(&mut self, product_id: i64) -> Result<&Cart, ApiError> {
        self.ensure_session()?;
        let result = self
            .send(ApiRequest::delete(paths::cart_item(product_id)))
            .await;
        self.apply(result, "Removed from cart", "Failed to remove item")
    }

    pub async fn clear(&mut self) -> Result<&Cart, ApiError> {
        self.ensure_session()?;
        let result = self.send(ApiRequest::delete(paths::CART)).await;
        self.apply(result, "Cart cleared", "Failed to clear cart")
    }
}

fn print_cart(client: &CartClient) {
    let cart = client.cart();
    if cart.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    println!();
    for item in &cart.items {
        println!(
            "  [{}] {:<32} {:>3} x {:>8} = {:>9}",
            item.product.id,
            item.product.name,
            item.quantity,
            item.product.price,
            item.total_price
        );
    }
    println!();
    println!("  Items: {}   Total: {}", client.count(), cart.total_cost);
}

/// Cart subcommands
pub enum CartAction {
    Show,
    Add { product_id: i64, quantity: u32 },
    Update { product_id: i64, quantity: u32 },
    Remove { product_id: i64 },
    Clear,
}

pub async fn run(api_url: Option<String>, action: CartAction) -> Result<()> {
    let app = App::authenticated(api_url).await?;
    let mut client = CartClient::new(app.api.clone(), app.notifier.clone());

    let mutation = match action {
        CartAction::Show => {
            client.fetch().await?;
            Ok(())
        }
        CartAction::Add {
            product_id,
            quantity,
        } => client.add_item(product_id, quantity).await.map(|_| ()),
        CartAction::Update {
            product_id,
            quantity,
        } => client.update_item(product_id, quantity).await.map(|_| ()),
        CartAction::Remove { product_id } => client.remove_item(product_id).await.map(|_| ()),
        CartAction::Clear => client.clear().await.map(|_| ()),
    };
    mutation.map_err(|e| Reported(format!("Cart update failed: {}", e)))?;

    print_cart(&client);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::mock::MockTransport;
    use crate::auth::tokens::CredentialPair;
    use crate::auth::TokenStore;
    use crate::config::MemoryStore;
    use crate::notify::RecordingNotifier;
    use reqwest::Method;

    fn snapshot(lines: &[(i64, u32)]) -> serde_json::Value {
        let items: Vec<_> = lines
            .iter()
            .map(|(id, qty)| {
                json!({
                    "id": id * 10,
                    "product": {
                        "id": id,
                        "name": format!("Product {}", id),
                        "price": "5.00",
                        "quantity": 10,
                    },
                    "quantity": qty,
                    "total_price": format!("{}.00", 5 * qty),
                })
            })
            .collect();
        let total: u32 = lines.iter().map(|(_, q)| q).sum();
        json!({
            "items": items,
            "total_items": total,
            "total_cost": format!("{}.00", 5 * total),
        })
    }

    fn setup(logged_in: bool) -> (Arc<MockTransport>, Arc<RecordingNotifier>, CartClient) {
        let mock = Arc::new(MockTransport::new());
        let tokens = TokenStore::new(Arc::new(MemoryStore::default()));
        if logged_in {
            tokens
                .set_credentials(&CredentialPair {
                    access_token: "a1".into(),
                    refresh_token: "r1".into(),
                })
                .unwrap();
        }
        let api = Arc::new(ApiClient::new(mock.clone(), tokens));
        let notifier = Arc::new(RecordingNotifier::default());
        let client = CartClient::new(api, notifier.clone());
        (mock, notifier, client)
    }

    #[tokio::test]
    async fn test_add_item_uses_server_count() {
        let (mock, notifier, mut client) = setup(true);
        mock.on(Method::GET, paths::CART, 200, snapshot(&[(3, 4)]));
        mock.on(Method::POST, paths::CART_ITEMS, 200, snapshot(&[(5, 2)]));

        client.fetch().await.unwrap();
        assert_eq!(client.count(), 4);

        client.add_item(5, 2).await.unwrap();

        // Server snapshot replaces local state; no increment on top of 4.
        assert_eq!(client.count(), 2);
        assert_eq!(client.cart().items.len(), 1);
        assert_eq!(client.cart().items[0].product.id, 5);
        assert_eq!(notifier.successes(), vec!["Added to cart".to_string()]);

        let add = mock
            .requests()
            .into_iter()
            .find(|r| r.method == Method::POST)
            .unwrap();
        assert_eq!(add.body, Some(json!({ "product_id": 5, "quantity": 2 })));
        assert_eq!(add.bearer.as_deref(), Some("a1"));
        assert!(add.query_value("_t").is_some());
    }

    #[tokio::test]
    async fn test_requires_session() {
        let (mock, notifier, mut client) = setup(false);

        let err = client.add_item(5, 2).await.unwrap_err();

        assert!(matches!(err, ApiError::NoSession));
        assert!(mock.requests().is_empty());
        assert_eq!(notifier.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_snapshot() {
        let (mock, notifier, mut client) = setup(true);
        mock.on(Method::GET, paths::CART, 200, snapshot(&[(1, 1)]));
        mock.on(
            Method::POST,
            paths::CART_ITEMS,
            400,
            json!({ "detail": "Only 10 items available in stock" }),
        );

        client.fetch().await.unwrap();
        let before = client.cart().clone();

        assert!(client.add_item(1, 50).await.is_err());

        assert_eq!(client.cart(), &before);
        assert_eq!(
            notifier.errors(),
            vec!["Only 10 items available in stock".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_snapshot() {
        let (mock, _notifier, mut client) = setup(true);
        mock.on(Method::GET, paths::CART, 200, snapshot(&[(1, 3)]));
        mock.fail(Method::GET, paths::CART, "timeout");

        client.fetch().await.unwrap();
        assert!(client.fetch().await.is_err());
        assert_eq!(client.count(), 3);
    }

    #[tokio::test]
    async fn test_update_zero_removes() {
        let (mock, _notifier, mut client) = setup(true);
        mock.on(Method::DELETE, &paths::cart_item(7), 200, snapshot(&[]));

        client.update_item(7, 0).await.unwrap();

        assert_eq!(mock.count(Method::DELETE, &paths::cart_item(7)), 1);
        assert_eq!(mock.count(Method::PUT, &paths::cart_item(7)), 0);
        assert_eq!(client.count(), 0);
        assert!(client.cart().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_clear() {
        let (mock, notifier, mut client) = setup(true);
        mock.on(Method::PUT, &paths::cart_item(2), 200, snapshot(&[(2, 6)]));
        mock.on(Method::DELETE, paths::CART, 200, snapshot(&[]));

        client.update_item(2, 6).await.unwrap();
        assert_eq!(client.count(), 6);
        assert_eq!(client.cart().total_cost, "30.00");

        client.clear().await.unwrap();
        assert_eq!(client.count(), 0);
        assert_eq!(
            notifier.successes(),
            vec!["Cart updated".to_string(), "Cart cleared".to_string()]
        );
    }
}
