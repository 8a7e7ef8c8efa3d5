pub mod app;
pub mod calculator;
pub mod client;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod onboarding;
pub mod settings;
pub mod store;

pub use error::{Error, ProfileError, Result};
