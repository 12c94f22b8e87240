#![warn(clippy::unwrap_used)]

pub mod session;

pub use session::SessionCache;
