//! Core domain types and logic.

pub mod article;
pub mod calendar;
pub mod checkpoint;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod pipeline;
pub mod report;
pub mod retry;
pub mod score;
pub mod sentiment;
