pub mod binance;
pub mod commands;
pub mod config;
pub mod error;
pub mod features;
pub mod model;
pub mod models;
pub mod report;
pub mod snapshot;
