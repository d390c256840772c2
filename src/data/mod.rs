//! Data ingestion
//!
//! HTTP clients for the API-Sports services, the open-data event reader and
//! the response cache shared by both.

pub mod cache;
pub mod client;
pub mod normalize;
pub mod sources;

pub use cache::{CacheKey, ResponseCache};
pub use client::{ApiClient, JsonSource};
pub use normalize::{flatten, FlatRecord};
