pub mod app;
pub mod config;
pub mod core;
pub mod error;
pub mod fetch;
pub mod model;
pub mod stats;
pub mod ui;
