//! HTTP client module
//!
//! Fetches the election feed with token authentication.
//!
//! # Overview
//!
//! - [`FeedClient`]: authenticated GET returning raw records
//! - [`HttpClientConfig`]: timeout, user agent, extra headers
//! - [`parse_feed`]: body → records, rejecting anything but an array of objects

mod client;

pub use client::{parse_feed, FeedClient, HttpClientConfig, HttpClientConfigBuilder};

#[cfg(test)]
mod tests;
