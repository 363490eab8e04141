//! HTTP handlers for deepcytes-api.

pub mod auth;
pub mod files;
pub mod health;
pub mod search_history;
pub mod users;
