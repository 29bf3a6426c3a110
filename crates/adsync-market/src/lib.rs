//! # adsync-market
//!
//! Client for the marketplace's Pro Import API.
//!
//! - [`MarketplaceClient`]: the async trait the sync coordinator depends on
//! - [`HttpMarketplaceClient`]: the `reqwest` implementation
//! - [`vehicle_to_request`]: builds a create request from inventory data

pub mod client;
pub mod error;
pub mod request;
pub mod wire;

pub use client::{HttpMarketplaceClient, MarketplaceClient};
pub use error::MarketplaceError;
pub use request::vehicle_to_request;
pub use wire::*;
