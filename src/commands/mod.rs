pub mod refresh;
pub mod summary;
pub mod tickers;
