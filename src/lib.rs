pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod parse;
pub mod retry;
pub mod server;
pub mod service;
pub mod sheets;
pub mod source;
pub mod view;

pub use error::{DashboardError, Result};
pub use models::Job;
