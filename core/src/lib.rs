pub mod action;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod exploit;
pub mod memory;
pub mod pipeline;
pub mod style;
pub mod testing;

pub use crate::config::Config;
