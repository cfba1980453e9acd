//! Tiki Product Reviewer Library
//!
//! Client for the Tiki product-review chatbot backend: a request dispatcher
//! with response caching, in-flight de-duplication and cancellation, endpoint
//! functions for every backend route, and cleaning of raw chatbot answers.

pub mod api;
pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod models;
pub mod normalize;
