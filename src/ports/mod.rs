//! Port traits the domain depends on.

pub mod checkpoint_port;
pub mod config_port;
pub mod market_data_port;
pub mod polarity_port;
pub mod report_port;
pub mod sentiment_model_port;
pub mod store_port;
pub mod ticker_port;
