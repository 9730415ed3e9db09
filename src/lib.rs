pub mod commands;
pub mod config;
pub mod error;
pub mod extract;
pub mod ledger;
pub mod logging;
pub mod repos;
pub mod synth;

pub use config::Config;
pub use error::{Error, Result};
