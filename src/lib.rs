pub mod app;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod input;
pub mod output;
pub mod progress;
pub mod query;
pub mod store;
