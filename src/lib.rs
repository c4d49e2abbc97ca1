pub mod aggregator;
pub mod api;
pub mod client;
pub mod config;
pub mod detail;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod models;
pub mod pagination;
pub mod profile;
pub mod token;
