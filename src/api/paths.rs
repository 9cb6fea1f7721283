//! Endpoint paths, relative to the API base URL

pub const LOGIN: &str = "/api/user/login/";
pub const REGISTER: &str = "/api/user/register/";
pub const LOGOUT: &str = "/logout/";
pub const PROFILE: &str = "/api/user/";
pub const TOKEN_REFRESH: &str = "/token/refresh/";

pub const PRODUCTS: &str = "/api/products/";
pub const CATEGORIES: &str = "/api/products/categories/";

pub const CART: &str = "/api/user/cart/";
pub const CART_ITEMS: &str = "/api/user/cart/items/";

pub const ORDERS: &str = "/api/user/orders/";
pub const PAYMENTS: &str = "/api/user/payments/";
pub const ADDRESSES: &str = "/api/user/profile/address/";

pub fn product(id: i64) -> String {
    format!("{}{}/", PRODUCTS, id)
}

pub fn cart_item(product_id: i64) -> String {
    format!("{}{}/", CART_ITEMS, product_id)
}

pub fn order(id: i64) -> String {
    format!("{}{}/", ORDERS, id)
}

pub fn stripe_checkout(order_id: i64) -> String {
    format!(
        "{}stripe/create-checkout-session/{}/",
        PAYMENTS, order_id
    )
}
