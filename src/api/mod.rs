pub mod client;
pub mod document;
pub mod models;

pub use client::{ApiError, CatalogClient, Result};
pub use document::{Anchor, Document};
pub use models::ApiConfig;
