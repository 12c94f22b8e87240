#![warn(clippy::unwrap_used)]

pub mod channel_rest;
pub mod dashboard_rest;
pub mod loyalty_rest;
pub mod rest;
pub mod server;
pub mod settings_rest;
pub mod swagger;

pub use rest::AppState;
pub use server::{router, ApiServer};
pub use swagger::ApiDoc;
