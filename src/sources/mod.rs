//! Headline sources.
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | NewsAPI | [`newsapi`] | `/everything` search | Requires API key; relevancy-sorted |
//!
//! A source exposes `fetch_headlines()`, which returns at most
//! [`MAX_HEADLINES`] normalized [`Headline`](crate::models::Headline)s in
//! the order the API ranked them.

pub mod newsapi;

/// Upper bound on headlines handed to the classifier.
pub const MAX_HEADLINES: usize = 15;
