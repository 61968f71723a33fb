pub mod auth;
pub mod tasks;

pub use tasks::TaskApi;
