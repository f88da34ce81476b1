pub mod algorithms;
pub mod config;
pub mod env;
pub mod error;
pub mod observer;
pub mod policy;
pub mod utils;

pub use error::{Error, Result};
