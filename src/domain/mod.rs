//! Core domain types and computation. No I/O.

pub mod ohlcv;
pub mod position;
pub mod series;
pub mod indicator;
pub mod strategy;
pub mod backtest;
pub mod metrics;
pub mod score;
pub mod registry;
pub mod engine;
pub mod config_validation;
pub mod error;
