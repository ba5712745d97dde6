pub mod aggregator;
pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod scheduler;
pub mod services;
pub mod types;
pub mod venues;
