//! Web-related modules for HTTP handlers and page rendering

pub mod errors;
pub mod handlers;
pub mod pages;

pub use handlers::*;
