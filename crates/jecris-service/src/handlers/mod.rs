//! API handlers.

pub mod auth;
pub mod books;
pub mod cart;
pub mod health;
pub mod library;
pub mod payments;
pub mod read;
pub mod users;
pub mod webhooks;
