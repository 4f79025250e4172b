pub mod aggregator;
pub mod commands;
pub mod config;
pub mod context;
pub mod fetcher;
pub mod http_client;
pub mod markets;
pub mod models;
pub mod scoring;
pub mod snapshot;
pub mod tickers;
pub mod yahoo;
