//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
pub mod json_checkpoint_adapter;
pub mod openai_adapter;
pub mod polygon_adapter;
pub mod sqlite_adapter;
pub mod text_report_adapter;
pub mod vader_adapter;
