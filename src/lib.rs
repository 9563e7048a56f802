pub mod agent;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod los;
pub mod schema;
pub mod server;
pub mod store;
pub mod tools;

pub use error::{Error, Result};
