//! Authentication module for the storefront
//!
//! Access/refresh token storage, unverified claims decoding, and the
//! session lifecycle built on top of them.

pub mod claims;
mod commands;
pub mod session;
pub mod tokens;

pub use commands::{login, logout, register, status, whoami};
pub use session::SessionManager;
pub use tokens::TokenStore;
