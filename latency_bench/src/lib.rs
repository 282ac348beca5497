pub mod app;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod input;
pub mod latency;
pub mod local;
pub mod model_handle;
pub mod remote;
pub mod report;
pub mod selection;

#[cfg(test)]
mod test_support;

pub use app::{start_app, Bench};
