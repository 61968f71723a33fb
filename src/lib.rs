//! Library exports for taskdesk, shared between the binary and tests.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod refresh;
pub mod session;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;

pub use error::ClientError;
