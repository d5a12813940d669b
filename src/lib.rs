pub mod args;
pub mod backup;
pub mod chart;
pub mod commands;
mod config;
pub mod converter;
mod error;
pub mod list;
pub mod model;
pub mod rates;
pub mod storage;
pub mod store;
pub mod tracker;
mod utils;

#[cfg(test)]
mod test;

pub use config::Config;
pub use error::{Error, ErrorType, IntoResult, Result};
pub use rates::Mode;
